use std::collections::HashMap;

/// Producer id allocation for InitProducerId.
#[derive(Debug, Default)]
pub(crate) struct Pids {
    next: i64,
    transactional: HashMap<String, (i64, i16)>,
}

impl Pids {
    fn fresh(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The (producer id, epoch) for a producer starting up.
    ///
    /// A transactional id keeps its producer id across restarts and has its
    /// epoch bumped, getting a new id once the epoch is exhausted.
    pub fn init(&mut self, transactional_id: Option<&str>) -> (i64, i16) {
        let Some(txn) = transactional_id else {
            return (self.fresh(), 0);
        };
        let pid = match self.transactional.get(txn) {
            Some(&(id, epoch)) if epoch < i16::MAX => (id, epoch + 1),
            _ => (self.fresh(), 0),
        };
        self.transactional.insert(txn.to_owned(), pid);
        pid
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn idempotent_producers_get_new_ids() {
        let mut pids = Pids::default();
        assert_eq!(pids.init(None), (0, 0));
        assert_eq!(pids.init(None), (1, 0));
    }

    #[test]
    fn transactional_epoch_bumps_and_rolls_over() {
        let mut pids = Pids::default();
        assert_eq!(pids.init(Some("tx")), (0, 0));
        assert_eq!(pids.init(Some("tx")), (0, 1));
        assert_eq!(pids.init(Some("other")), (1, 0));

        pids.transactional.insert("tx".to_owned(), (0, i16::MAX));
        assert_eq!(pids.init(Some("tx")), (2, 0));
    }
}
