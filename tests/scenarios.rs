// tests/scenarios.rs

use chrono::{Duration as ChronoDuration, Utc};
use muxpick::backend::{AppendMode, Backend, BackendError, RunOptions, choose_backend};
use muxpick::core::cache::{self, CacheEntry, MemoryStore, OptionStore};
use muxpick::core::layout_resolver;
use muxpick::core::reconciler::{Multiplexer, SessionInfo, WindowInfo, WindowSpec, reconcile_session};
use muxpick::models::{App, Command, Config, Layout, Target};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::Duration;

// --- Fakes ---

/// Records every call and keeps windows per session so reconciles can be repeated.
#[derive(Default)]
struct FakeMux {
    sessions: RefCell<BTreeMap<String, Vec<WindowInfo>>>,
    calls: RefCell<Vec<String>>,
    failing_sends: bool,
}

impl FakeMux {
    fn with_session(name: &str, windows: &[(u32, &str)]) -> Self {
        let mux = Self::default();
        mux.sessions.borrow_mut().insert(
            name.to_string(),
            windows
                .iter()
                .map(|(index, name)| WindowInfo { index: *index, name: name.to_string() })
                .collect(),
        );
        mux
    }

    fn log(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn count(&self, prefix: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

impl Multiplexer for FakeMux {
    fn backend_name(&self) -> &'static str {
        "fake"
    }

    fn list_sessions(&self) -> Result<Vec<SessionInfo>, BackendError> {
        Ok(self
            .sessions
            .borrow()
            .keys()
            .map(|name| SessionInfo { name: name.clone(), attached: false })
            .collect())
    }

    fn list_windows(&self, session: &str) -> Result<Vec<WindowInfo>, BackendError> {
        Ok(self.sessions.borrow().get(session).cloned().unwrap_or_default())
    }

    fn create_session(&self, session: &str, first: &WindowSpec) -> Result<(), BackendError> {
        self.log(format!("create-session {} {}:{}", session, first.index, first.name));
        self.sessions.borrow_mut().insert(
            session.to_string(),
            vec![WindowInfo { index: first.index, name: first.name.clone() }],
        );
        Ok(())
    }

    fn create_window(&self, session: &str, window: &WindowSpec) -> Result<(), BackendError> {
        self.log(format!("create-window {} {}:{}", session, window.index, window.name));
        self.sessions
            .borrow_mut()
            .entry(session.to_string())
            .or_default()
            .push(WindowInfo { index: window.index, name: window.name.clone() });
        Ok(())
    }

    fn list_panes(&self, session: &str, window: u32) -> Result<Vec<String>, BackendError> {
        Ok(vec![format!("%{}-{}", session, window)])
    }

    fn send_command(&self, pane: &str, command: &str) -> Result<(), BackendError> {
        self.log(format!("send {} {}", pane, command));
        if self.failing_sends {
            return Err(BackendError::IpcReply {
                backend: "fake",
                message: "pane is gone".into(),
            });
        }
        Ok(())
    }

    fn select_window(&self, session: &str, window: u32) -> Result<(), BackendError> {
        self.log(format!("select {}:{}", session, window));
        Ok(())
    }

    fn attach(&self, session: &str) -> Result<(), BackendError> {
        self.log(format!("attach {}", session));
        Ok(())
    }

    fn kill_session(&self, session: &str) -> Result<(), BackendError> {
        self.sessions.borrow_mut().remove(session);
        Ok(())
    }
}

struct FakeBackend {
    name: &'static str,
    order: i32,
}

impl Backend for FakeBackend {
    fn name(&self) -> &'static str {
        self.name
    }
    fn check(&self) -> bool {
        true
    }
    fn order(&self) -> i32 {
        self.order
    }
    fn run(&self, _target: &Target, _opts: &RunOptions) -> Result<(), BackendError> {
        Ok(())
    }
}

// --- Helpers ---

fn app(name: &str, commands: &[&str], default: bool) -> App {
    App {
        name: name.to_string(),
        commands: commands.iter().map(|c| Command::new(*c)).collect(),
        default,
        ..App::default()
    }
}

fn project_target() -> Target {
    Target {
        provider_name: "work".into(),
        provider_type: "project".into(),
        id: "/tmp/api".into(),
        name: "api".into(),
        display_name: "api".into(),
        start_directory: "/tmp".into(),
        ..Target::default()
    }
}

fn run_options(layout: Layout, append_mode: AppendMode) -> RunOptions {
    RunOptions {
        session_name: "api".into(),
        layout,
        append_mode,
    }
}

// --- Scenarios ---

#[test]
fn test_default_layout_is_used_without_template() {
    // --- Setup ---
    let mut config = Config::default();
    config.layouts.insert(
        "default".into(),
        Layout { apps: vec![app("bash", &[], true)], ..Layout::default() },
    );
    let target = project_target();

    // --- Execute ---
    let default_name = layout_resolver::default_layout_name(&config, &target);
    let layout = layout_resolver::resolve(&config, &target, "", &default_name).unwrap();

    // --- Assert ---
    assert_eq!(default_name, "default");
    assert_eq!(layout.apps.len(), 1);
    assert_eq!(layout.apps[0].name, "bash");
}

#[test]
fn test_group_keeps_only_first_passing_app() {
    let mut vim = app("vim", &["vim"], false);
    vim.group = "editor".into();
    vim.rules = vec!["false".into()];
    let mut nvim = app("nvim", &["nvim"], false);
    nvim.group = "editor".into();
    let mut helix = app("helix", &["hx"], false);
    helix.group = "editor".into();

    let mut config = Config::default();
    config.layouts.insert(
        "default".into(),
        Layout { apps: vec![app("bash", &[], true), vim, nvim, helix], ..Layout::default() },
    );

    let layout = layout_resolver::resolve(&config, &project_target(), "", "default").unwrap();

    let names: Vec<&str> = layout.apps.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["bash", "nvim"]);
}

#[test]
fn test_placeholders_resolve_from_context() {
    let mut target = project_target();
    target.context.insert("user".into(), "root".into());
    target.context.insert("host".into(), "db1".into());

    assert_eq!(target.resolve_placeholders("ssh {{user}}@{{host}}"), "ssh root@db1");
}

#[test]
fn test_stale_cache_triggers_live_discovery() {
    // --- Setup ---
    let store = MemoryStore::new();
    let mut entry = CacheEntry::new("hosts", vec![Target { id: "old".into(), ..Target::default() }]);
    entry.created_at = Utc::now() - ChronoDuration::seconds(1000);
    store.put(&entry).unwrap();

    // --- Execute ---
    let mut live_calls = 0;
    let options = cache::options_or_cache(&store, "hosts", Duration::from_secs(300), || {
        live_calls += 1;
        Ok::<_, std::io::Error>(vec![Target { id: "new".into(), ..Target::default() }])
    })
    .unwrap();

    // --- Assert ---
    assert_eq!(live_calls, 1);
    assert_eq!(options[0].id, "new");
    let refreshed = store.get("hosts").unwrap().unwrap();
    assert_eq!(refreshed.options[0].id, "new");
}

#[test]
fn test_highest_order_backend_wins() {
    let backends: Vec<Box<dyn Backend>> = vec![
        Box::new(FakeBackend { name: "low", order: 100 }),
        Box::new(FakeBackend { name: "high", order: 200 }),
    ];

    let chosen = choose_backend(backends, None).unwrap();

    assert_eq!(chosen.name(), "high");
}

#[test]
fn test_existing_session_is_attached_without_changes() {
    let mux = FakeMux::with_session("api", &[(1, "bash")]);
    let layout = Layout { apps: vec![app("bash", &[], true), app("nvim", &["nvim"], false)], ..Layout::default() };

    reconcile_session(&mux, &project_target(), &run_options(layout, AppendMode::CreateOrAttach), 1).unwrap();

    assert_eq!(mux.count("create-"), 0);
    assert_eq!(*mux.calls.borrow(), vec!["attach api".to_string()]);
}

#[test]
fn test_new_session_is_created_populated_and_attached() {
    let mux = FakeMux::default();
    let layout = Layout {
        apps: vec![app("bash", &[], false), app("nvim", &["nvim {{name}}"], true)],
        ..Layout::default()
    };

    reconcile_session(&mux, &project_target(), &run_options(layout, AppendMode::CreateOrAttach), 1).unwrap();

    assert_eq!(
        *mux.calls.borrow(),
        vec![
            "create-session api 1:bash".to_string(),
            "create-window api 2:nvim".to_string(),
            "send %api-2 nvim api".to_string(),
            "select api:2".to_string(),
            "attach api".to_string(),
        ]
    );
}

#[test]
fn test_append_mode_only_creates_missing_windows_once() {
    // --- Setup ---
    let mux = FakeMux::with_session("api", &[(1, "bash")]);
    let layout = Layout { apps: vec![app("bash", &[], true), app("logs", &[], false)], ..Layout::default() };
    let opts = run_options(layout, AppendMode::Append);

    // --- Execute ---
    reconcile_session(&mux, &project_target(), &opts, 1).unwrap();
    reconcile_session(&mux, &project_target(), &opts, 1).unwrap();

    // --- Assert ---
    assert_eq!(mux.count("create-window"), 1);
    assert_eq!(mux.count("create-session"), 0);
    assert_eq!(mux.count("attach"), 2);
    let windows = mux.list_windows("api").unwrap();
    let names: Vec<&str> = windows.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["bash", "logs"]);
    assert_eq!(windows[1].index, 2);
}

#[test]
fn test_command_failure_aborts_and_names_the_step() {
    // --- Setup ---
    let mux = FakeMux { failing_sends: true, ..FakeMux::default() };
    let layout = Layout {
        apps: vec![app("editor", &["nvim {{name}}", "echo never"], true)],
        ..Layout::default()
    };

    // --- Execute ---
    let err = reconcile_session(&mux, &project_target(), &run_options(layout, AppendMode::CreateOrAttach), 1)
        .unwrap_err();

    // --- Assert ---
    assert!(matches!(
        &err,
        BackendError::Step { backend: "fake", session, window, command, .. }
            if session == "api" && window == "editor" && command == "nvim api"
    ));
    assert!(err.to_string().contains("window 'editor': 'nvim api' failed"));
    assert_eq!(mux.count("send"), 1);
    assert_eq!(mux.count("select"), 0);
    assert_eq!(mux.count("attach"), 0);
}
