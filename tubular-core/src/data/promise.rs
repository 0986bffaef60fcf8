use crate::error::Error;

/// State of an asynchronous value: not yet requested, in flight (tagged with
/// the deferred request `D`), or settled with either the value or an error.
#[derive(Clone, Debug)]
pub enum Promise<T, D = (), E = Error> {
    Empty,
    Deferred(D),
    Resolved(T),
    Rejected(E),
}

#[derive(Eq, PartialEq, Debug)]
pub enum PromiseState {
    Empty,
    Deferred,
    Resolved,
    Rejected,
}

impl<T, D, E> Promise<T, D, E> {
    pub fn state(&self) -> PromiseState {
        match self {
            Self::Empty => PromiseState::Empty,
            Self::Deferred(_) => PromiseState::Deferred,
            Self::Resolved(_) => PromiseState::Resolved,
            Self::Rejected(_) => PromiseState::Rejected,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    pub fn is_deferred(&self, def: &D) -> bool
    where
        D: PartialEq,
    {
        matches!(self, Self::Deferred(d) if d == def)
    }

    pub fn resolved(&self) -> Option<&T> {
        match self {
            Self::Resolved(val) => Some(val),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::Empty;
    }

    pub fn defer(&mut self, def: D) {
        *self = Self::Deferred(def);
    }

    pub fn resolve(&mut self, val: T) {
        *self = Self::Resolved(val);
    }

    pub fn reject(&mut self, err: E) {
        *self = Self::Rejected(err);
    }

    pub fn resolve_or_reject(&mut self, res: Result<T, E>) {
        *self = match res {
            Ok(ok) => Self::Resolved(ok),
            Err(err) => Self::Rejected(err),
        };
    }

    /// Settle the promise with `res`, but only if it is still deferred with
    /// the matching request tag.
    pub fn update(&mut self, (def, res): (D, Result<T, E>))
    where
        D: PartialEq,
    {
        if self.is_deferred(&def) {
            self.resolve_or_reject(res);
        }
    }
}

impl<T, D: Default, E> Promise<T, D, E> {
    pub fn defer_default(&mut self) {
        *self = Self::Deferred(D::default())
    }
}

impl<T, D, E> Default for Promise<T, D, E> {
    fn default() -> Self {
        Self::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions() {
        let mut promise: Promise<u32, &str> = Promise::Empty;
        assert_eq!(promise.state(), PromiseState::Empty);

        promise.defer("req");
        assert!(promise.is_deferred(&"req"));
        assert!(!promise.is_deferred(&"other"));

        promise.resolve(1);
        assert_eq!(promise.state(), PromiseState::Resolved);
        assert_eq!(promise.resolved(), Some(&1));

        promise.reject(Error::Unauthenticated);
        assert!(promise.is_rejected());
        assert_eq!(promise.resolved(), None);

        promise.clear();
        assert!(promise.is_empty());
    }

    #[test]
    fn update_ignores_stale_tags() {
        let mut promise: Promise<u32, &str> = Promise::Empty;
        promise.defer("current");

        promise.update(("stale", Ok(1)));
        assert_eq!(promise.state(), PromiseState::Deferred);

        promise.update(("current", Ok(2)));
        assert_eq!(promise.resolved(), Some(&2));
    }

    #[test]
    fn resolve_or_reject_follows_result() {
        let mut promise: Promise<u32> = Promise::Empty;
        promise.resolve_or_reject(Ok(7));
        assert_eq!(promise.resolved(), Some(&7));

        promise.resolve_or_reject(Err(Error::WebApiError("boom".into())));
        assert!(promise.is_rejected());
    }
}
