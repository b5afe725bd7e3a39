//! Request interception.
//!
//! Control functions see a request before the cluster handles it and can
//! answer it themselves, swallow it, or fail the connection. A function
//! that handles a request is dropped unless it asked to be kept with
//! [`Cluster::keep_control`](crate::cluster::Cluster::keep_control).

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

use crate::{
    error::Error,
    protocol::{ApiKey, Request, Response},
};

/// What a control function decided to do with a request.
#[derive(Debug)]
pub enum Control {
    /// Not handled, try the next function and then the cluster itself.
    Pass,
    /// Reply with this response.
    Respond(Response),
    /// Handled, but send nothing back. The client will likely time out.
    Ignore,
    /// Close the client connection.
    Fail(Error),
}

impl Control {
    pub fn is_handled(&self) -> bool {
        !matches!(self, Control::Pass)
    }
}

pub type ControlFn = Box<dyn FnMut(&Request) -> Control + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ControlKey {
    Any,
    Key(i16),
}

impl From<ApiKey> for ControlKey {
    fn from(key: ApiKey) -> Self {
        ControlKey::Key(key as i16)
    }
}

#[derive(Default)]
pub(crate) struct ControlRegistry {
    fns: Mutex<HashMap<ControlKey, Vec<ControlFn>>>,
    keep_current: AtomicBool,
    /// Set by `clear`, after which nothing is registered again.
    cleared: AtomicBool,
}

impl ControlRegistry {
    fn lock(&self) -> MutexGuard<'_, HashMap<ControlKey, Vec<ControlFn>>> {
        self.fns.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, key: ControlKey, f: ControlFn) {
        let mut map = self.lock();
        if self.cleared.load(Ordering::SeqCst) {
            // dropped once the lock is released
            drop(map);
            drop(f);
            return;
        }
        map.entry(key).or_default().push(f);
    }

    pub fn keep_current(&self) {
        self.keep_current.store(true, Ordering::SeqCst);
    }

    /// Drops every function for good. Functions running right now are
    /// dropped once they return instead of going back in.
    pub fn clear(&self) {
        let fns = {
            let mut map = self.lock();
            self.cleared.store(true, Ordering::SeqCst);
            std::mem::take(&mut *map)
        };
        drop(fns);
    }

    pub fn len(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    /// Offers `req` to the functions for its key, then to the wildcard
    /// functions. Returns the first decision that handled it.
    pub fn try_control(&self, req: &Request) -> Option<Control> {
        let key = ControlKey::Key(req.key());
        self.try_list(key, req)
            .or_else(|| self.try_list(ControlKey::Any, req))
    }

    fn try_list(&self, key: ControlKey, req: &Request) -> Option<Control> {
        // the lock is not held while functions run, they may register more
        let mut fns = match self.lock().remove(&key) {
            Some(fns) if !fns.is_empty() => fns,
            _ => return None,
        };

        let mut decided = None;
        for i in 0..fns.len() {
            self.keep_current.store(false, Ordering::SeqCst);
            let control = (fns[i])(req);
            if control.is_handled() {
                let f = fns.remove(i);
                let keep = self.keep_current.swap(false, Ordering::SeqCst);
                decided = Some((control, keep.then_some(f)));
                break;
            }
        }

        let mut map = self.lock();
        let added = map.remove(&key).unwrap_or_default();
        fns.extend(added);
        let control = decided.map(|(control, kept)| {
            fns.extend(kept);
            control
        });
        if !fns.is_empty() && !self.cleared.load(Ordering::SeqCst) {
            map.insert(key, fns);
        } else {
            drop(map);
            drop(fns);
        }
        control
    }
}

#[cfg(test)]
mod test {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use bytes::Bytes;

    use super::*;
    use crate::protocol::{MetadataRequest, UnsupportedRequest};

    fn metadata() -> Request {
        Request::Metadata(MetadataRequest::all())
    }

    fn respond_raw(tag: &'static [u8]) -> ControlFn {
        Box::new(move |_| Control::Respond(Response::Raw(Bytes::from_static(tag))))
    }

    fn raw(control: Option<Control>) -> Option<Bytes> {
        match control {
            Some(Control::Respond(Response::Raw(b))) => Some(b),
            _ => None,
        }
    }

    #[test]
    fn empty_registry_passes() {
        let registry = ControlRegistry::default();
        assert!(registry.try_control(&metadata()).is_none());
    }

    #[test]
    fn handled_function_is_removed() {
        let registry = ControlRegistry::default();
        registry.add(ApiKey::Metadata.into(), respond_raw(b"a"));

        assert_eq!(raw(registry.try_control(&metadata())).unwrap(), "a");
        assert!(registry.try_control(&metadata()).is_none());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn specific_key_before_wildcard() {
        let registry = ControlRegistry::default();
        registry.add(ControlKey::Any, respond_raw(b"any"));
        registry.add(ApiKey::Metadata.into(), respond_raw(b"key"));

        assert_eq!(raw(registry.try_control(&metadata())).unwrap(), "key");
        assert_eq!(raw(registry.try_control(&metadata())).unwrap(), "any");
    }

    #[test]
    fn passing_functions_stay_in_order() {
        let registry = ControlRegistry::default();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        registry.add(
            ControlKey::Any,
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Control::Pass
            }),
        );
        registry.add(ControlKey::Any, respond_raw(b"second"));

        assert_eq!(raw(registry.try_control(&metadata())).unwrap(), "second");
        assert!(registry.try_control(&metadata()).is_none());
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn kept_function_goes_after_new_ones() {
        let registry = Arc::new(ControlRegistry::default());
        let inner = registry.clone();
        let mut added = false;
        registry.add(
            ApiKey::Metadata.into(),
            Box::new(move |_| {
                if !added {
                    added = true;
                    inner.add(ApiKey::Metadata.into(), respond_raw(b"new"));
                }
                inner.keep_current();
                Control::Respond(Response::Raw(Bytes::from_static(b"kept")))
            }),
        );

        assert_eq!(raw(registry.try_control(&metadata())).unwrap(), "kept");
        assert_eq!(raw(registry.try_control(&metadata())).unwrap(), "new");
        assert_eq!(raw(registry.try_control(&metadata())).unwrap(), "kept");
        assert_eq!(raw(registry.try_control(&metadata())).unwrap(), "kept");
        // the registry holds a clone of itself through the kept function
        registry.clear();
    }

    #[test]
    fn keep_flag_resets_between_calls() {
        let registry = Arc::new(ControlRegistry::default());
        let inner = registry.clone();
        registry.add(
            ControlKey::Any,
            Box::new(move |_| {
                inner.keep_current();
                Control::Pass
            }),
        );
        registry.add(ControlKey::Any, respond_raw(b"once"));

        assert_eq!(raw(registry.try_control(&metadata())).unwrap(), "once");
        assert!(registry.try_control(&metadata()).is_none());
        registry.clear();
    }

    #[test]
    fn cleared_while_running_stays_cleared() {
        let registry = Arc::new(ControlRegistry::default());
        let inner = registry.clone();
        registry.add(
            ApiKey::Metadata.into(),
            Box::new(move |_| {
                inner.clear();
                inner.keep_current();
                Control::Ignore
            }),
        );
        registry.add(ApiKey::Metadata.into(), respond_raw(b"never"));

        assert!(matches!(
            registry.try_control(&metadata()),
            Some(Control::Ignore)
        ));
        assert_eq!(registry.len(), 0);
        assert!(registry.try_control(&metadata()).is_none());

        registry.add(ControlKey::Any, respond_raw(b"late"));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn unsupported_requests_can_be_controlled() {
        let registry = ControlRegistry::default();
        registry.add(ControlKey::Key(11), Box::new(|_| Control::Ignore));

        let req = Request::Unsupported(UnsupportedRequest {
            api_key: 11,
            api_version: 0,
            body: Bytes::new(),
        });
        assert!(matches!(registry.try_control(&req), Some(Control::Ignore)));
    }
}
