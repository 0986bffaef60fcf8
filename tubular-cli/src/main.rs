use std::{
    collections::HashMap,
    env,
    io::{self, BufRead},
    sync::Arc,
    thread,
};

use crossbeam_channel::{select, unbounded, Receiver};

use tubular_core::{
    coordinator::{Coordinator, Update},
    data::{AppState, Promise, WatchCtx},
    session::SessionService,
    webapi::WebApi,
};

const API_ENV_VAR: &str = "TUBULAR_API";
const DEFAULT_API: &str = "http://localhost:7878";

fn main() {
    env_logger::init();

    let base_url = env::var(API_ENV_VAR).unwrap_or_else(|_| DEFAULT_API.to_string());
    let session = SessionService::new();
    WebApi::new(session.clone(), &base_url, None).install_as_global();
    let (coordinator, updates) = Coordinator::new(WebApi::global());

    let mut app = App {
        state: AppState::default(),
        session,
        coordinator,
        watch: HashMap::new(),
        seen_alerts: 0,
    };

    app.state.videos.defer(());
    app.coordinator.load_videos(None);
    if app.session.is_connected() {
        if let Some(user) = app.session.user() {
            println!("logged in as {}", user.name);
        }
        app.load_library();
    }
    println!("type `help` for commands");

    let lines = stdin_lines();
    loop {
        select! {
            recv(lines) -> line => match line {
                Ok(line) => {
                    if !app.handle_command(line.trim()) {
                        break;
                    }
                }
                Err(_) => break,
            },
            recv(updates) -> update => match update {
                Ok(update) => app.handle_update(update),
                Err(_) => break,
            },
        }
    }
}

fn stdin_lines() -> Receiver<String> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        for line in io::stdin().lock().lines().map_while(Result::ok) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

struct App {
    state: AppState,
    session: SessionService,
    coordinator: Coordinator,
    watch: HashMap<Arc<str>, WatchCtx>,
    seen_alerts: usize,
}

impl App {
    /// Returns false when the loop should stop.
    fn handle_command(&mut self, line: &str) -> bool {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("help") => print_help(),
            Some("login") => match (parts.next(), parts.next()) {
                (Some(email), Some(password)) => self.log_in(email, password),
                _ => println!("usage: login <email> <password>"),
            },
            Some("signup") => match (parts.next(), parts.next(), parts.next()) {
                (Some(name), Some(email), Some(password)) => self.sign_up(name, email, password),
                _ => println!("usage: signup <name> <email> <password>"),
            },
            Some("logout") => {
                WebApi::global().log_out();
                self.state.log_out();
                self.watch.clear();
                println!("logged out");
            }
            Some("videos") => self.list_videos(),
            Some("ls") => self.list_library(),
            Some("like") => self.toggle_like(parts.next()),
            Some("later") => self.toggle_watch_later(parts.next()),
            Some("watch") => self.watch_video(parts.next()),
            Some("rmhist") => self.delete_history(parts.next()),
            Some("newpl") => self.create_playlist(line),
            Some("addpl") => self.add_to_playlist(parts.next(), parts.next()),
            Some("quit") | Some("exit") => return false,
            Some(other) => println!("unknown command: {}", other),
            None => {}
        }
        true
    }

    fn handle_update(&mut self, update: Update) {
        log::debug!("update: {:?}", update);
        self.state.handle(update);
        // Confirmed membership feeds back into the local hints.
        for (video_id, ctx) in self.watch.iter_mut() {
            ctx.sync(&self.state.library, video_id);
        }
        for alert in self.state.alerts.iter().skip(self.seen_alerts) {
            println!("* {}", alert.message);
        }
        self.seen_alerts = self.state.alerts.len();
    }

    fn log_in(&mut self, email: &str, password: &str) {
        match WebApi::global().log_in(email, password) {
            Ok(user) => {
                println!("logged in as {}", user.name);
                self.load_library();
            }
            Err(err) => println!("login failed: {}", err),
        }
    }

    fn sign_up(&mut self, name: &str, email: &str, password: &str) {
        match WebApi::global().sign_up(name, email, password) {
            Ok(user) => {
                println!("welcome, {}", user.name);
                self.load_library();
            }
            Err(err) => println!("signup failed: {}", err),
        }
    }

    fn load_library(&mut self) {
        let library = &mut self.state.library;
        library.playlists.defer(());
        library.liked.defer(());
        library.watch_later.defer(());
        library.history.defer(());
        self.coordinator.load_playlists();
        self.coordinator.load_liked_videos();
        self.coordinator.load_watch_later_videos();
        self.coordinator.load_history_videos();
    }

    fn require_login(&self) -> bool {
        if self.session.is_connected() {
            true
        } else {
            println!("log in first");
            false
        }
    }

    fn list_videos(&self) {
        match &self.state.videos {
            Promise::Empty => println!("catalog not loaded"),
            Promise::Deferred(_) => println!("catalog loading..."),
            Promise::Rejected(err) => println!("catalog failed to load: {}", err),
            Promise::Resolved(videos) => {
                for video in videos {
                    println!("{}  {} ({})", video.id, video.title, video.channel_name);
                }
            }
        }
    }

    fn list_library(&self) {
        let library = &self.state.library;
        if let Some(playlists) = library.playlists.resolved() {
            println!("playlists:");
            for playlist in playlists {
                println!("  {}  {} ({} videos)", playlist.id, playlist.name, playlist.videos.len());
            }
        }
        for (name, collection) in [
            ("liked", &library.liked),
            ("watch later", &library.watch_later),
            ("history", &library.history),
        ] {
            if let Some(videos) = collection.resolved() {
                println!("{}:", name);
                for video in videos {
                    println!("  {}  {}", video.id, video.title);
                }
            }
        }
    }

    fn toggle_like(&mut self, video_id: Option<&str>) {
        let Some(video_id) = video_id else {
            println!("usage: like <video-id>");
            return;
        };
        if !self.require_login() {
            return;
        }
        let video_id: Arc<str> = video_id.into();
        let ctx = self
            .watch
            .entry(video_id.clone())
            .or_insert_with(|| WatchCtx::synced(&self.state.library, &video_id));
        let pre_toggle = ctx.like.flip();
        println!(
            "like {} -> {}",
            video_id,
            if ctx.like.is_active() { "on" } else { "off" }
        );
        self.coordinator.like(video_id, pre_toggle);
    }

    fn toggle_watch_later(&mut self, video_id: Option<&str>) {
        let Some(video_id) = video_id else {
            println!("usage: later <video-id>");
            return;
        };
        if !self.require_login() {
            return;
        }
        let video_id: Arc<str> = video_id.into();
        let ctx = self
            .watch
            .entry(video_id.clone())
            .or_insert_with(|| WatchCtx::synced(&self.state.library, &video_id));
        let pre_toggle = ctx.watch_later.flip();
        println!(
            "watch later {} -> {}",
            video_id,
            if ctx.watch_later.is_active() { "on" } else { "off" }
        );
        self.coordinator.watch_later(video_id, pre_toggle);
    }

    fn watch_video(&mut self, video_id: Option<&str>) {
        let Some(video_id) = video_id else {
            println!("usage: watch <video-id>");
            return;
        };
        match self.state.video(video_id) {
            Some(video) => println!("playing {}", video.url()),
            None => println!("playing {}", video_id),
        }
        // Watch history is only kept for logged-in users.
        if self.session.is_connected() {
            self.coordinator.record_history(video_id.into());
        }
    }

    fn delete_history(&mut self, video_id: Option<&str>) {
        let Some(video_id) = video_id else {
            println!("usage: rmhist <video-id>");
            return;
        };
        if !self.require_login() {
            return;
        }
        self.coordinator.delete_history_video(video_id.into());
    }

    fn create_playlist(&mut self, line: &str) {
        let name = line.strip_prefix("newpl").map(str::trim).unwrap_or_default();
        if name.is_empty() {
            println!("usage: newpl <name>");
            return;
        }
        if !self.require_login() {
            return;
        }
        self.coordinator.create_playlist(name.to_string());
    }

    fn add_to_playlist(&mut self, playlist_id: Option<&str>, video_id: Option<&str>) {
        let (Some(playlist_id), Some(video_id)) = (playlist_id, video_id) else {
            println!("usage: addpl <playlist-id> <video-id>");
            return;
        };
        if !self.require_login() {
            return;
        }
        if self.state.library.is_in_playlist(playlist_id, video_id) {
            println!("already in playlist");
            return;
        }
        self.coordinator
            .add_to_playlist(playlist_id.into(), video_id.into());
    }
}

fn print_help() {
    println!("commands:");
    println!("  login <email> <password>     log in");
    println!("  signup <name> <email> <pw>   create an account");
    println!("  logout                       log out and clear the library");
    println!("  videos                       list the catalog");
    println!("  ls                           list playlists and collections");
    println!("  like <video-id>              toggle a like");
    println!("  later <video-id>             toggle watch-later");
    println!("  watch <video-id>             play a video, record history");
    println!("  rmhist <video-id>            remove a video from history");
    println!("  newpl <name>                 create a playlist");
    println!("  addpl <playlist> <video>     add a video to a playlist");
    println!("  quit                         exit");
}
