use std::{collections::HashMap, fmt::Display, sync::Arc, thread, time::Duration};

use im::Vector;
use once_cell::sync::OnceCell;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use ureq::{
    http::{Response, StatusCode},
    Agent, Body,
};

use crate::{
    data::{Playlist, Video},
    error::Error,
    session::{SessionService, UserSession},
};

/// Gateway to the remote REST API.  Performs blocking calls, attaches the
/// bearer token of the active session to all user endpoints, and treats the
/// server as authoritative for every collection it returns.
pub struct WebApi {
    session: SessionService,
    agent: Agent,
    protocol: String,
    base_uri: String,
}

impl WebApi {
    pub fn new(session: SessionService, base_url: &str, proxy_url: Option<&str>) -> Self {
        let mut agent = Agent::config_builder().timeout_global(Some(Duration::from_secs(5)));
        if let Some(proxy_url) = proxy_url {
            let proxy = ureq::Proxy::new(proxy_url).ok();
            agent = agent.proxy(proxy);
        }
        let (protocol, base_uri) = match base_url.split_once("://") {
            Some((protocol, base_uri)) => (protocol.to_string(), base_uri.to_string()),
            None => ("https".to_string(), base_url.to_string()),
        };
        Self {
            session,
            agent: agent.build().into(),
            protocol,
            base_uri,
        }
    }

    pub fn session(&self) -> &SessionService {
        &self.session
    }

    fn bearer(&self) -> Result<Arc<str>, Error> {
        self.session.token().ok_or(Error::Unauthenticated)
    }

    fn perform(
        &self,
        request: &RequestBuilder,
        token: Option<&str>,
    ) -> Result<Response<Body>, Error> {
        let request = request
            .clone()
            .set_protocol(&self.protocol)
            .set_base_uri(&self.base_uri);
        let url = request.build();

        match request.get_method() {
            Method::Get => {
                let mut req = self.agent.get(url.as_str());
                if let Some(token) = token {
                    req = req.header("Authorization", &format!("Bearer {}", token));
                }
                req.call().map_err(Error::from)
            }
            Method::Post => {
                let mut req = self.agent.post(url.as_str());
                if let Some(token) = token {
                    req = req.header("Authorization", &format!("Bearer {}", token));
                }
                req.send_json(request.get_body().cloned().unwrap_or_else(|| json!({})))
                    .map_err(Error::from)
            }
            Method::Delete => {
                let mut req = self.agent.delete(url.as_str());
                if let Some(token) = token {
                    req = req.header("Authorization", &format!("Bearer {}", token));
                }
                req.call().map_err(Error::from)
            }
        }
    }

    /// Perform `request` with the bearer token of the active session, or
    /// refuse outright when nobody is logged in.
    fn request(&self, request: &RequestBuilder) -> Result<Response<Body>, Error> {
        let token = self.bearer()?;
        self.perform(request, Some(&token))
    }

    fn with_retry(f: impl Fn() -> Result<Response<Body>, Error>) -> Result<Response<Body>, Error> {
        loop {
            let response = f()?;
            match response.status() {
                StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after_secs = response
                        .headers()
                        .get("Retry-After")
                        .and_then(|secs| secs.to_str().ok());
                    let secs = retry_after_secs.unwrap_or("2").parse::<u64>().unwrap_or(2);
                    thread::sleep(Duration::from_secs(secs));
                }
                _ => {
                    break Ok(response);
                }
            }
        }
    }

    /// Send an authenticated request and return the deserialized JSON body.
    fn load<T: DeserializeOwned>(&self, request: &RequestBuilder) -> Result<T, Error> {
        let mut response = Self::with_retry(|| self.request(request))?;
        response.body_mut().read_json().map_err(Error::from)
    }

    /// Send a request without credentials.  Used for the auth endpoints and
    /// the public catalog.
    fn load_public<T: DeserializeOwned>(&self, request: &RequestBuilder) -> Result<T, Error> {
        let mut response = Self::with_retry(|| self.perform(request, None))?;
        response.body_mut().read_json().map_err(Error::from)
    }
}

static GLOBAL_WEBAPI: OnceCell<Arc<WebApi>> = OnceCell::new();

/// Global instance.
impl WebApi {
    pub fn install_as_global(self) {
        GLOBAL_WEBAPI
            .set(Arc::new(self))
            .map_err(|_| "Cannot install more than once")
            .unwrap()
    }

    pub fn global() -> Arc<Self> {
        GLOBAL_WEBAPI.get().unwrap().clone()
    }
}

/// Auth endpoints.
impl WebApi {
    pub fn log_in(&self, email: &str, password: &str) -> Result<UserSession, Error> {
        #[derive(Deserialize)]
        struct LoggedIn {
            user: UserSession,
        }

        let request = &RequestBuilder::new(
            "api/auth/login",
            Method::Post,
            Some(json!({ "email": email, "password": password })),
        );
        let result: LoggedIn = self.load_public(request)?;
        self.session.attach(result.user.clone());
        Ok(result.user)
    }

    pub fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<UserSession, Error> {
        #[derive(Deserialize)]
        struct SignedUp {
            user: UserSession,
        }

        let request = &RequestBuilder::new(
            "api/auth/signup",
            Method::Post,
            Some(json!({ "name": name, "email": email, "password": password })),
        );
        let result: SignedUp = self.load_public(request)?;
        self.session.attach(result.user.clone());
        Ok(result.user)
    }

    pub fn log_out(&self) {
        self.session.clear();
    }
}

/// Catalog endpoints.
impl WebApi {
    pub fn get_videos(&self, category: Option<&str>) -> Result<Vector<Video>, Error> {
        #[derive(Deserialize)]
        struct AllVideos {
            videos: Vector<Video>,
        }

        let mut request = RequestBuilder::new("api/videos", Method::Get, None);
        if let Some(category) = category {
            request = request.query("category", category);
        }
        Ok(self.load_public::<AllVideos>(&request)?.videos)
    }
}

/// Library endpoints.  Every response carries the full post-mutation state of
/// the touched collection; the caller replaces its copy wholesale.
impl WebApi {
    pub fn get_playlists(&self) -> Result<Vector<Playlist>, Error> {
        let request = &RequestBuilder::new("api/user/playlists", Method::Get, None);
        Ok(self.load::<PlaylistsResponse>(request)?.playlists)
    }

    pub fn create_playlist(&self, name: &str) -> Result<Playlist, Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Created {
            new_playlist: Playlist,
        }

        let request = &RequestBuilder::new(
            "api/user/playlists",
            Method::Post,
            Some(json!({ "name": name })),
        );
        Ok(self.load::<Created>(request)?.new_playlist)
    }

    pub fn add_to_playlist(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<Vector<Playlist>, Error> {
        let request = &RequestBuilder::new(
            "api/user/playlists/add",
            Method::Post,
            Some(json!({ "playlistId": playlist_id, "videoId": video_id })),
        );
        Ok(self.load::<PlaylistsResponse>(request)?.playlists)
    }

    pub fn get_liked_videos(&self) -> Result<Vector<Video>, Error> {
        let request = &RequestBuilder::new("api/user/likes", Method::Get, None);
        Ok(self.load::<LikedResponse>(request)?.liked_playlist.videos)
    }

    pub fn like(&self, video_id: &str) -> Result<Vector<Video>, Error> {
        let request = &RequestBuilder::new(
            format!("api/user/likes/{}", video_id),
            Method::Post,
            None,
        );
        Ok(self.load::<LikedResponse>(request)?.liked_playlist.videos)
    }

    pub fn get_watch_later_videos(&self) -> Result<Vector<Video>, Error> {
        let request = &RequestBuilder::new("api/user/watchlater", Method::Get, None);
        Ok(self
            .load::<WatchLaterResponse>(request)?
            .watch_later_playlist
            .videos)
    }

    pub fn watch_later(&self, video_id: &str) -> Result<Vector<Video>, Error> {
        let request = &RequestBuilder::new(
            format!("api/user/watchlater/{}", video_id),
            Method::Post,
            None,
        );
        Ok(self
            .load::<WatchLaterResponse>(request)?
            .watch_later_playlist
            .videos)
    }

    pub fn get_history_videos(&self) -> Result<Vector<Video>, Error> {
        let request = &RequestBuilder::new("api/user/history", Method::Get, None);
        Ok(self.load::<HistoryResponse>(request)?.history.videos)
    }

    pub fn record_history(&self, video_id: &str) -> Result<Vector<Video>, Error> {
        let request = &RequestBuilder::new(
            format!("api/user/history/{}", video_id),
            Method::Post,
            None,
        );
        Ok(self.load::<HistoryResponse>(request)?.history.videos)
    }

    pub fn delete_history_video(&self, video_id: &str) -> Result<Vector<Video>, Error> {
        let request = &RequestBuilder::new(
            format!("api/user/history/{}", video_id),
            Method::Delete,
            None,
        );
        Ok(self.load::<HistoryResponse>(request)?.history.videos)
    }
}

#[derive(Clone, Deserialize)]
struct PlaylistVideos {
    videos: Vector<Video>,
}

#[derive(Clone, Deserialize)]
struct PlaylistsResponse {
    playlists: Vector<Playlist>,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LikedResponse {
    liked_playlist: PlaylistVideos,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WatchLaterResponse {
    watch_later_playlist: PlaylistVideos,
}

#[derive(Clone, Deserialize)]
struct HistoryResponse {
    history: PlaylistVideos,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Method {
    Get,
    Post,
    Delete,
}

#[derive(Clone)]
struct RequestBuilder {
    protocol: String,
    base_uri: String,
    path: String,
    queries: HashMap<String, String>,
    method: Method,
    body: Option<serde_json::Value>,
}

impl RequestBuilder {
    fn new(path: impl Display, method: Method, body: Option<serde_json::Value>) -> Self {
        Self {
            protocol: "https".to_string(),
            base_uri: "localhost".to_string(),
            path: path.to_string(),
            queries: HashMap::new(),
            method,
            body,
        }
    }

    fn query(mut self, key: impl Display, value: impl Display) -> Self {
        self.queries.insert(key.to_string(), value.to_string());
        self
    }

    fn set_protocol(mut self, protocol: impl Display) -> Self {
        self.protocol = protocol.to_string();
        self
    }

    fn set_base_uri(mut self, base_uri: impl Display) -> Self {
        self.base_uri = base_uri.to_string();
        self
    }

    fn get_method(&self) -> Method {
        self.method
    }

    fn get_body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    fn build(&self) -> String {
        let mut url = format!("{}://{}/{}", self.protocol, self.base_uri, self.path);
        if !self.queries.is_empty() {
            url.push('?');
            url.push_str(
                &self
                    .queries
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join("&"),
            );
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_plain_url() {
        let request = RequestBuilder::new("api/user/history/abc", Method::Delete, None)
            .set_protocol("http")
            .set_base_uri("localhost:7878");
        assert_eq!(request.build(), "http://localhost:7878/api/user/history/abc");
    }

    #[test]
    fn builds_url_with_query() {
        let request = RequestBuilder::new("api/videos", Method::Get, None)
            .set_protocol("http")
            .set_base_uri("localhost:7878")
            .query("category", "music");
        assert_eq!(
            request.build(),
            "http://localhost:7878/api/videos?category=music"
        );
    }

    #[test]
    fn refuses_user_endpoints_without_session() {
        let api = WebApi::new(
            SessionService::with_storage(None),
            "http://localhost:7878",
            None,
        );
        assert!(matches!(api.get_playlists(), Err(Error::Unauthenticated)));
        assert!(matches!(api.like("v1"), Err(Error::Unauthenticated)));
    }

    #[test]
    fn splits_base_url() {
        let api = WebApi::new(SessionService::with_storage(None), "http://my-host:80", None);
        assert_eq!(api.protocol, "http");
        assert_eq!(api.base_uri, "my-host:80");

        let api = WebApi::new(SessionService::with_storage(None), "tubular.example.com", None);
        assert_eq!(api.protocol, "https");
        assert_eq!(api.base_uri, "tubular.example.com");
    }

    #[test]
    fn decodes_collection_envelopes() {
        let liked: LikedResponse =
            serde_json::from_str(r#"{"likedPlaylist": {"videos": []}}"#).unwrap();
        assert!(liked.liked_playlist.videos.is_empty());

        let later: WatchLaterResponse =
            serde_json::from_str(r#"{"watchLaterPlaylist": {"videos": []}}"#).unwrap();
        assert!(later.watch_later_playlist.videos.is_empty());

        let history: HistoryResponse =
            serde_json::from_str(r#"{"history": {"videos": []}}"#).unwrap();
        assert!(history.history.videos.is_empty());

        let playlists: PlaylistsResponse = serde_json::from_str(
            r#"{"playlists": [{"_id": "p1", "name": "Favorites", "videos": []}]}"#,
        )
        .unwrap();
        assert_eq!(playlists.playlists[0].name.as_ref(), "Favorites");
    }
}
