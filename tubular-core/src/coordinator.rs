use std::{collections::HashMap, sync::Arc};

use crossbeam_channel::{unbounded, Receiver, Sender};
use im::Vector;
use parking_lot::Mutex;
use threadpool::ThreadPool;

use crate::{
    data::{like_feedback, watch_later_feedback, Action, AppState, Playlist, Video},
    error::Error,
    webapi::WebApi,
};

/// One entry per gateway operation.  In-flight tracking is per kind; kinds
/// never block each other.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MutationKind {
    LoadVideos,
    LoadPlaylists,
    LoadLikedVideos,
    LoadWatchLaterVideos,
    LoadHistoryVideos,
    CreatePlaylist,
    AddToPlaylist,
    DeleteHistoryVideo,
    RecordHistory,
    Like,
    WatchLater,
}

/// Result of a gateway operation, sent from a worker thread to the single
/// consumer that folds it into [`AppState`].  Load and mutation results are
/// kept apart: a failed load rejects its collection promise, a failed
/// mutation leaves the collection at its last-known-good value.
#[derive(Debug)]
pub enum Update {
    Videos(Result<Vector<Video>, Error>),
    Playlists(Result<Vector<Playlist>, Error>),
    LikedVideos(Result<Vector<Video>, Error>),
    WatchLaterVideos(Result<Vector<Video>, Error>),
    HistoryVideos(Result<Vector<Video>, Error>),
    PlaylistCreated(Result<Playlist, Error>),
    PlaylistsChanged(Result<Vector<Playlist>, Error>),
    HistoryChanged(Result<Vector<Video>, Error>),
    Liked {
        pre_toggle: bool,
        videos: Result<Vector<Video>, Error>,
    },
    WatchLater {
        pre_toggle: bool,
        videos: Result<Vector<Video>, Error>,
    },
}

/// Dispatches gateway operations onto a worker pool and posts each result
/// back over a channel.  Requests are not de-duplicated and never cancelled;
/// a kind re-invoked while still in flight simply runs again.
#[derive(Clone)]
pub struct Coordinator {
    api: Arc<WebApi>,
    pool: ThreadPool,
    sink: Sender<Update>,
    pending: Arc<Mutex<HashMap<MutationKind, usize>>>,
}

impl Coordinator {
    pub fn new(api: Arc<WebApi>) -> (Self, Receiver<Update>) {
        const MAX_WORKER_THREADS: usize = 8;

        let (sink, updates) = unbounded();
        let coordinator = Self {
            api,
            pool: ThreadPool::with_name("webapi".into(), MAX_WORKER_THREADS),
            sink,
            pending: Arc::default(),
        };
        (coordinator, updates)
    }

    pub fn is_loading(&self, kind: MutationKind) -> bool {
        self.pending.lock().get(&kind).is_some_and(|count| *count > 0)
    }

    fn submit(&self, kind: MutationKind, job: impl FnOnce(&WebApi) -> Update + Send + 'static) {
        {
            let mut pending = self.pending.lock();
            let count = pending.entry(kind).or_insert(0);
            *count += 1;
            if *count > 1 {
                log::warn!("async action pending: {:?}", kind);
            }
        }
        let api = self.api.clone();
        let sink = self.sink.clone();
        let pending = self.pending.clone();
        self.pool.execute(move || {
            let update = job(&api);
            if let Some(count) = pending.lock().get_mut(&kind) {
                *count -= 1;
            }
            if sink.send(update).is_err() {
                log::warn!("update receiver dropped");
            }
        });
    }

    pub fn load_videos(&self, category: Option<String>) {
        self.submit(MutationKind::LoadVideos, move |api| {
            Update::Videos(api.get_videos(category.as_deref()))
        });
    }

    pub fn load_playlists(&self) {
        self.submit(MutationKind::LoadPlaylists, |api| {
            Update::Playlists(api.get_playlists())
        });
    }

    pub fn load_liked_videos(&self) {
        self.submit(MutationKind::LoadLikedVideos, |api| {
            Update::LikedVideos(api.get_liked_videos())
        });
    }

    pub fn load_watch_later_videos(&self) {
        self.submit(MutationKind::LoadWatchLaterVideos, |api| {
            Update::WatchLaterVideos(api.get_watch_later_videos())
        });
    }

    pub fn load_history_videos(&self) {
        self.submit(MutationKind::LoadHistoryVideos, |api| {
            Update::HistoryVideos(api.get_history_videos())
        });
    }

    pub fn create_playlist(&self, name: String) {
        self.submit(MutationKind::CreatePlaylist, move |api| {
            Update::PlaylistCreated(api.create_playlist(&name))
        });
    }

    pub fn add_to_playlist(&self, playlist_id: Arc<str>, video_id: Arc<str>) {
        self.submit(MutationKind::AddToPlaylist, move |api| {
            Update::PlaylistsChanged(api.add_to_playlist(&playlist_id, &video_id))
        });
    }

    pub fn record_history(&self, video_id: Arc<str>) {
        self.submit(MutationKind::RecordHistory, move |api| {
            Update::HistoryChanged(api.record_history(&video_id))
        });
    }

    pub fn delete_history_video(&self, video_id: Arc<str>) {
        self.submit(MutationKind::DeleteHistoryVideo, move |api| {
            Update::HistoryChanged(api.delete_history_video(&video_id))
        });
    }

    /// `pre_toggle` is the hint value before the caller flipped it; it picks
    /// the success feedback, independent of the server response.
    pub fn like(&self, video_id: Arc<str>, pre_toggle: bool) {
        self.submit(MutationKind::Like, move |api| Update::Liked {
            pre_toggle,
            videos: api.like(&video_id),
        });
    }

    pub fn watch_later(&self, video_id: Arc<str>, pre_toggle: bool) {
        self.submit(MutationKind::WatchLater, move |api| Update::WatchLater {
            pre_toggle,
            videos: api.watch_later(&video_id),
        });
    }
}

impl AppState {
    /// Fold one settled operation into the store.  Runs on the consumer
    /// thread, one update at a time; each success replaces exactly one
    /// collection through the reducer.
    pub fn handle(&mut self, update: Update) {
        match update {
            Update::Videos(result) => self.videos.resolve_or_reject(result),
            Update::Playlists(result) => match result {
                Ok(playlists) => self.library.dispatch(Action::FetchPlaylists(playlists)),
                Err(err) => {
                    self.error_alert(err.to_string());
                    self.library.playlists.reject(err);
                }
            },
            Update::LikedVideos(result) => match result {
                Ok(videos) => self.library.dispatch(Action::AddToLikedVideos(videos)),
                Err(err) => {
                    self.error_alert(err.to_string());
                    self.library.liked.reject(err);
                }
            },
            Update::WatchLaterVideos(result) => match result {
                Ok(videos) => self.library.dispatch(Action::AddToWatchLaterVideos(videos)),
                Err(err) => {
                    self.error_alert(err.to_string());
                    self.library.watch_later.reject(err);
                }
            },
            Update::HistoryVideos(result) => match result {
                Ok(videos) => self.library.dispatch(Action::FetchHistoryVideos(videos)),
                Err(err) => {
                    self.error_alert(err.to_string());
                    self.library.history.reject(err);
                }
            },
            Update::PlaylistCreated(result) => match result {
                Ok(playlist) => self.library.dispatch(Action::CreatePlaylist(playlist)),
                Err(err) => self.error_alert(err.to_string()),
            },
            Update::PlaylistsChanged(result) => match result {
                Ok(playlists) => self.library.dispatch(Action::FetchPlaylists(playlists)),
                Err(err) => self.error_alert(err.to_string()),
            },
            Update::HistoryChanged(result) => match result {
                Ok(videos) => self.library.dispatch(Action::FetchHistoryVideos(videos)),
                Err(err) => self.error_alert(err.to_string()),
            },
            Update::Liked { pre_toggle, videos } => match videos {
                Ok(videos) => {
                    self.library.dispatch(Action::AddToLikedVideos(videos));
                    self.info_alert(like_feedback(pre_toggle));
                }
                Err(err) => self.error_alert(err.to_string()),
            },
            Update::WatchLater { pre_toggle, videos } => match videos {
                Ok(videos) => {
                    self.library.dispatch(Action::AddToWatchLaterVideos(videos));
                    self.info_alert(watch_later_feedback(pre_toggle));
                }
                Err(err) => self.error_alert(err.to_string()),
            },
        }
    }
}
