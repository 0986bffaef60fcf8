use crate::data::Library;

/// Local optimistic state of a like / watch-later button.  The hint is
/// flipped at click time, before the server answers, and is never reconciled
/// against the response.  Confirmed membership lives only in [`Library`];
/// collapsing the two tiers would change visible behavior on slow networks.
#[derive(Clone, Debug, Default)]
pub struct ToggleHint {
    active: bool,
}

impl ToggleHint {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Flip the hint and return its pre-toggle value.  Success feedback is
    /// keyed on the returned value, not on the server response.
    pub fn flip(&mut self) -> bool {
        let before = self.active;
        self.active = !self.active;
        before
    }

    /// Fold confirmed membership into the hint.  One-directional: a video
    /// found in the collection raises the hint, absence leaves it alone.
    pub fn observe_membership(&mut self, confirmed: bool) {
        if confirmed {
            self.active = true;
        }
    }
}

/// Per-video view-model pairing the two optimistic toggles.
#[derive(Clone, Debug, Default)]
pub struct WatchCtx {
    pub like: ToggleHint,
    pub watch_later: ToggleHint,
}

impl WatchCtx {
    /// Build a context with hints primed from confirmed membership.
    pub fn synced(library: &Library, video_id: &str) -> Self {
        let mut ctx = Self::default();
        ctx.sync(library, video_id);
        ctx
    }

    pub fn sync(&mut self, library: &Library, video_id: &str) {
        self.like.observe_membership(library.is_liked(video_id));
        self.watch_later
            .observe_membership(library.is_watch_later(video_id));
    }
}

pub fn like_feedback(pre_toggle: bool) -> &'static str {
    if pre_toggle {
        "Removed from liked videos"
    } else {
        "Added to liked videos"
    }
}

pub fn watch_later_feedback(pre_toggle: bool) -> &'static str {
    if pre_toggle {
        "Removed from watch later"
    } else {
        "Added to watch later"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_reports_pre_toggle_value() {
        let mut hint = ToggleHint::default();
        assert!(!hint.flip());
        assert!(hint.is_active());
        assert!(hint.flip());
        assert!(!hint.is_active());
    }

    #[test]
    fn membership_only_raises_the_hint() {
        let mut hint = ToggleHint::default();
        hint.observe_membership(false);
        assert!(!hint.is_active());

        hint.observe_membership(true);
        assert!(hint.is_active());

        // A later miss must not lower an already raised hint.
        hint.observe_membership(false);
        assert!(hint.is_active());
    }

    #[test]
    fn feedback_follows_pre_toggle_state() {
        assert_eq!(like_feedback(false), "Added to liked videos");
        assert_eq!(like_feedback(true), "Removed from liked videos");
        assert_eq!(watch_later_feedback(false), "Added to watch later");
        assert_eq!(watch_later_feedback(true), "Removed from watch later");
    }
}
