mod ctx;
mod playlist;
mod promise;
mod video;

pub use crate::data::{
    ctx::{like_feedback, watch_later_feedback, ToggleHint, WatchCtx},
    playlist::Playlist,
    promise::{Promise, PromiseState},
    video::Video,
};

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use im::Vector;

pub const ALERT_DURATION: Duration = Duration::from_secs(5);

static ALERT_ID: AtomicUsize = AtomicUsize::new(0);

/// Top-level client state: the public video catalog, the per-user library,
/// and transient user-visible alerts.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub videos: Promise<Vector<Video>>,
    pub library: Library,
    pub alerts: Vector<Alert>,
}

impl AppState {
    /// Tear down user state alongside credential removal.  The catalog is
    /// public and stays.
    pub fn log_out(&mut self) {
        self.library = Library::default();
    }

    pub fn video(&self, id: &str) -> Option<&Video> {
        self.videos
            .resolved()
            .and_then(|videos| videos.iter().find(|video| &*video.id == id))
    }
}

impl AppState {
    pub fn info_alert(&mut self, message: impl Into<Arc<str>>) {
        self.add_alert(message, AlertStyle::Info);
    }

    pub fn error_alert(&mut self, message: impl Into<Arc<str>>) {
        self.add_alert(message, AlertStyle::Error);
    }

    fn add_alert(&mut self, message: impl Into<Arc<str>>, style: AlertStyle) {
        self.alerts.push_back(Alert {
            id: ALERT_ID.fetch_add(1, Ordering::SeqCst),
            message: message.into(),
            style,
            created_at: Instant::now(),
        });
    }

    pub fn dismiss_alert(&mut self, id: usize) {
        self.alerts.retain(|alert| alert.id != id);
    }

    pub fn cleanup_alerts(&mut self) {
        let now = Instant::now();
        self.alerts
            .retain(|alert| now.duration_since(alert.created_at) < ALERT_DURATION);
    }
}

/// Transient toast-style notification.
#[derive(Clone, Debug)]
pub struct Alert {
    pub id: usize,
    pub message: Arc<str>,
    pub style: AlertStyle,
    pub created_at: Instant,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AlertStyle {
    Error,
    Info,
}

/// Single source of truth for playlist and interaction-collection data.
/// Each collection reflects the most recent successful server response, or
/// is `Empty` when not yet loaded.  Mutated only through [`Library::dispatch`].
#[derive(Clone, Debug, Default)]
pub struct Library {
    pub playlists: Promise<Vector<Playlist>>,
    pub liked: Promise<Vector<Video>>,
    pub watch_later: Promise<Vector<Video>>,
    pub history: Promise<Vector<Video>>,
}

/// Store actions, dispatched from mutation success callbacks.  The enum is
/// closed, so the reducer is total by construction.
#[derive(Clone, Debug)]
pub enum Action {
    CreatePlaylist(Playlist),
    FetchPlaylists(Vector<Playlist>),
    FetchHistoryVideos(Vector<Video>),
    AddToLikedVideos(Vector<Video>),
    AddToWatchLaterVideos(Vector<Video>),
}

impl Library {
    /// Pure state transition.  No I/O happens here; every action replaces or
    /// extends exactly one collection, all-or-nothing.
    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::CreatePlaylist(playlist) => self.add_playlist(playlist),
            Action::FetchPlaylists(playlists) => self.playlists.resolve(playlists),
            Action::FetchHistoryVideos(videos) => self.history.resolve(videos),
            Action::AddToLikedVideos(videos) => self.liked.resolve(videos),
            Action::AddToWatchLaterVideos(videos) => self.watch_later.resolve(videos),
        }
    }

    fn add_playlist(&mut self, playlist: Playlist) {
        if let Promise::Resolved(playlists) = &mut self.playlists {
            playlists.push_back(playlist);
        } else {
            self.playlists.resolve(Vector::unit(playlist));
        }
    }

    pub fn playlist(&self, playlist_id: &str) -> Option<&Playlist> {
        self.playlists
            .resolved()
            .and_then(|playlists| playlists.iter().find(|p| &*p.id == playlist_id))
    }

    pub fn is_liked(&self, video_id: &str) -> bool {
        is_member(self.liked.resolved(), video_id)
    }

    pub fn is_watch_later(&self, video_id: &str) -> bool {
        is_member(self.watch_later.resolved(), video_id)
    }

    pub fn is_in_history(&self, video_id: &str) -> bool {
        is_member(self.history.resolved(), video_id)
    }

    pub fn is_in_playlist(&self, playlist_id: &str, video_id: &str) -> bool {
        self.playlist(playlist_id)
            .map_or(false, |playlist| playlist.contains(video_id))
    }
}

/// Derived-membership view: does `video_id` belong to the collection?  An
/// absent collection counts as empty.
pub fn is_member(videos: Option<&Vector<Video>>, video_id: &str) -> bool {
    videos.map_or(false, |videos| {
        videos.iter().any(|video| &*video.id == video_id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn video(id: &str) -> Video {
        Video {
            id: id.into(),
            video_id: format!("yt-{id}").into(),
            title: format!("Video {id}").into(),
            channel_name: "Channel".into(),
            channel_display_pic: "https://example.com/pic.jpg".into(),
            view_count: "1K".into(),
            upload_date: "Jan 1, 2022".into(),
            like_count: 10,
            subscribers: "5K".into(),
        }
    }

    pub fn playlist(id: &str, name: &str, videos: &[&str]) -> Playlist {
        Playlist {
            id: id.into(),
            name: name.into(),
            videos: videos.iter().map(|v| video(v)).collect(),
        }
    }

    #[test]
    fn fetch_replaces_playlists_wholesale() {
        let mut library = Library::default();
        library.dispatch(Action::FetchPlaylists(Vector::unit(playlist(
            "p0", "Old", &[],
        ))));

        let replacement = Vector::from(vec![
            playlist("p1", "Rock", &["v1"]),
            playlist("p2", "Jazz", &[]),
        ]);
        library.dispatch(Action::FetchPlaylists(replacement.clone()));

        assert_eq!(library.playlists.resolved(), Some(&replacement));
    }

    #[test]
    fn create_appends_in_insertion_order() {
        let mut library = Library::default();
        library.dispatch(Action::FetchPlaylists(Vector::from(vec![
            playlist("p1", "One", &[]),
            playlist("p2", "Two", &[]),
        ])));
        library.dispatch(Action::CreatePlaylist(playlist("p3", "Three", &[])));

        let names: Vec<_> = library
            .playlists
            .resolved()
            .unwrap()
            .iter()
            .map(|p| p.name.to_string())
            .collect();
        assert_eq!(names, ["One", "Two", "Three"]);
    }

    #[test]
    fn create_on_empty_state_resolves_singleton() {
        let mut library = Library::default();
        assert!(library.playlists.is_empty());

        library.dispatch(Action::CreatePlaylist(playlist("p1", "Favorites", &[])));

        let playlists = library.playlists.resolved().unwrap();
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].name.as_ref(), "Favorites");
        assert!(playlists[0].videos.is_empty());
    }

    #[test]
    fn dispatch_is_deterministic() {
        let action = Action::AddToLikedVideos(Vector::from(vec![video("a"), video("b")]));

        let mut first = Library::default();
        let mut second = Library::default();
        first.dispatch(action.clone());
        second.dispatch(action);

        assert_eq!(first.liked.resolved(), second.liked.resolved());
    }

    #[test]
    fn actions_touch_only_their_collection() {
        let mut library = Library::default();
        library.dispatch(Action::AddToLikedVideos(Vector::unit(video("a"))));
        library.dispatch(Action::AddToWatchLaterVideos(Vector::unit(video("b"))));

        assert!(library.is_liked("a"));
        assert!(!library.is_liked("b"));
        assert!(library.is_watch_later("b"));
        assert!(library.history.is_empty());
        assert!(library.playlists.is_empty());
    }

    #[test]
    fn membership_on_absent_collection_is_false() {
        assert!(!is_member(None, "any"));
        assert!(!is_member(Some(&Vector::new()), "any"));

        let library = Library::default();
        assert!(!library.is_liked("any"));
        assert!(!library.is_in_playlist("p1", "any"));
    }

    #[test]
    fn membership_scans_by_id() {
        let videos = Vector::from(vec![video("a"), video("b")]);
        assert!(is_member(Some(&videos), "b"));
        assert!(!is_member(Some(&Vector::unit(video("a"))), "b"));
    }

    #[test]
    fn logout_clears_the_library_but_not_the_catalog() {
        let mut state = AppState::default();
        state.videos.resolve(Vector::unit(video("a")));
        state
            .library
            .dispatch(Action::AddToLikedVideos(Vector::unit(video("a"))));

        state.log_out();

        assert!(state.library.liked.is_empty());
        assert!(state.videos.is_resolved());
    }

    #[test]
    fn alerts_dismiss_by_id() {
        let mut state = AppState::default();
        state.info_alert("first");
        state.error_alert("second");
        assert_eq!(state.alerts.len(), 2);

        let first_id = state.alerts[0].id;
        state.dismiss_alert(first_id);
        assert_eq!(state.alerts.len(), 1);
        assert_eq!(state.alerts[0].message.as_ref(), "second");
        assert_eq!(state.alerts[0].style, AlertStyle::Error);
    }

    #[test]
    fn cleanup_keeps_fresh_alerts() {
        let mut state = AppState::default();
        state.info_alert("fresh");
        state.cleanup_alerts();
        assert_eq!(state.alerts.len(), 1);

        state.alerts[0].created_at = Instant::now() - ALERT_DURATION;
        state.cleanup_alerts();
        assert!(state.alerts.is_empty());
    }
}
