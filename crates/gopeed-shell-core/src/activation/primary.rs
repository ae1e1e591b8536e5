use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::activation::errors::ActivationError;
use crate::activation::types::ActivationPayload;
use crate::engine::{Engine, EngineSession};
use crate::instance::IdentityClaim;
use crate::ipc::ChannelServer;
use crate::platform::Platform;
use crate::window::{WindowHost, WindowRelay, WindowSpec};

/// Everything the primary instance needs to come up.
pub struct Bootstrap<'a, E: ?Sized, H, P> {
    pub engine: &'a E,
    pub host: &'a H,
    pub platform: &'a P,
    pub engine_config: &'a str,
    pub window: &'a WindowSpec,
}

impl<E, H, P> Bootstrap<'_, E, H, P>
where
    E: Engine + ?Sized,
    H: WindowHost,
    P: Platform,
{
    /// Run the primary instance until its event loop exits.
    ///
    /// The channel is served from right after the claim, so later launches
    /// are answered while the engine starts; their links wait for the
    /// window. The engine is started before the window exists and stopped
    /// on every path out, after the channel and the platform subsystem are
    /// released. `claim` is held until the very end.
    pub fn run<C: IdentityClaim>(
        &self,
        claim: C,
        payload: ActivationPayload,
    ) -> Result<(), ActivationError> {
        self.platform.prepare_console();
        let subsystem = self.platform.enter_subsystem()?;

        let shutdown = CancellationToken::new();
        let relay = Arc::new(WindowRelay::new(self.window.title.clone()));
        let channel = ChannelServer::start(claim.endpoint(), relay.clone(), shutdown.clone())
            .map_err(ActivationError::ChannelFailed)?;

        let session = match EngineSession::open(self.engine, self.engine_config) {
            Ok(session) => session,
            Err(e) => {
                channel.stop();
                return Err(e.into());
            }
        };

        let result = self.run_window(&relay, &shutdown, payload).inspect(|_| {
            info!(
                event = "core.activation.primary_stopped",
                endpoint = %claim.endpoint(),
                engine = session.handle().get(),
            );
        });

        channel.stop();
        drop(subsystem);
        session.close();
        drop(claim);

        result
    }

    fn run_window(
        &self,
        relay: &WindowRelay<H::Window>,
        shutdown: &CancellationToken,
        payload: ActivationPayload,
    ) -> Result<(), ActivationError> {
        let window = self
            .host
            .create_window(self.window, payload)
            .map_err(ActivationError::WindowCreationFailed)?;
        relay.attach(window.clone());

        info!(event = "core.activation.primary_running", title = self.window.title);

        self.host
            .run_event_loop(window, shutdown)
            .map_err(ActivationError::EventLoopFailed)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tempfile::TempDir;

    use crate::engine::{EngineError, EngineHandle};
    use crate::instance::{Endpoint, InstanceIdentity};
    use crate::ipc::{InstanceClient, IpcError};
    use crate::platform::PlatformError;
    use crate::window::{PrimaryWindow, ShowCommand, ShowState, WindowError};

    /// Shared log of lifecycle steps, in order.
    type Steps = Arc<Mutex<Vec<String>>>;

    fn push(steps: &Steps, step: impl Into<String>) {
        steps.lock().unwrap().push(step.into());
    }

    struct FakeEngine {
        steps: Steps,
        fail: bool,
        stops: AtomicUsize,
        /// Forward a link to this endpoint while starting.
        forward_to: Option<Endpoint>,
    }

    impl Engine for FakeEngine {
        fn start(&self, config: &str) -> Result<EngineHandle, EngineError> {
            if let Some(endpoint) = &self.forward_to {
                let mut client = InstanceClient::connect(endpoint, Duration::from_secs(2)).unwrap();
                client.ping().unwrap();
                client
                    .open_links("act-early", &["gopeed://early".to_string()])
                    .unwrap();
                push(&self.steps, "link.forwarded");
            }
            if self.fail {
                return Err(EngineError::StartFailed {
                    message: "no port".to_string(),
                });
            }
            push(&self.steps, format!("engine.start {}", config));
            EngineHandle::new(17842)
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
            push(&self.steps, "engine.stop");
        }
    }

    #[derive(Default)]
    struct FakeWindow {
        links: Mutex<Vec<String>>,
    }

    impl PrimaryWindow for FakeWindow {
        fn title(&self) -> &str {
            "gopeed"
        }
        fn show_state(&self) -> ShowState {
            ShowState::Normal
        }
        fn is_foreground(&self) -> bool {
            true
        }
        fn apply_show_command(&self, _command: ShowCommand) -> Result<(), WindowError> {
            Ok(())
        }
        fn bring_to_foreground(&self) -> Result<(), WindowError> {
            Ok(())
        }
        fn open_links(&self, links: Vec<String>) -> Result<(), WindowError> {
            self.links.lock().unwrap().extend(links);
            Ok(())
        }
    }

    struct FakeHost {
        steps: Steps,
        fail_loop: bool,
        created: Mutex<Option<Arc<FakeWindow>>>,
    }

    impl WindowHost for FakeHost {
        type Window = FakeWindow;

        fn create_window(
            &self,
            spec: &WindowSpec,
            startup_args: ActivationPayload,
        ) -> Result<Arc<FakeWindow>, WindowError> {
            spec.validate()?;
            push(
                &self.steps,
                format!("window.create {}", startup_args.as_slice().join(" ")),
            );
            let window = Arc::new(FakeWindow::default());
            *self.created.lock().unwrap() = Some(window.clone());
            Ok(window)
        }

        fn run_event_loop(
            &self,
            _window: Arc<FakeWindow>,
            shutdown: &CancellationToken,
        ) -> Result<(), WindowError> {
            push(&self.steps, "loop");
            if self.fail_loop {
                return Err(WindowError::EventLoopFailed {
                    message: "message pump died".to_string(),
                });
            }
            shutdown.cancel();
            Ok(())
        }
    }

    struct FakeContext(Steps);

    impl Drop for FakeContext {
        fn drop(&mut self) {
            push(&self.0, "subsystem.exit");
        }
    }

    struct FakePlatform(Steps);

    impl Platform for FakePlatform {
        type Context = FakeContext;

        fn prepare_console(&self) {
            push(&self.0, "console");
        }

        fn enter_subsystem(&self) -> Result<FakeContext, PlatformError> {
            push(&self.0, "subsystem.enter");
            Ok(FakeContext(self.0.clone()))
        }
    }

    struct FakeClaim(Endpoint, Steps);

    impl IdentityClaim for FakeClaim {
        fn endpoint(&self) -> &Endpoint {
            &self.0
        }
    }

    impl Drop for FakeClaim {
        fn drop(&mut self) {
            push(&self.1, "claim.release");
        }
    }

    struct Fixture {
        dir: TempDir,
        endpoint: Endpoint,
        steps: Steps,
        engine: FakeEngine,
        host: FakeHost,
        platform: FakePlatform,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let endpoint = Endpoint::new(&InstanceIdentity::new("gopeed", "cls"), dir.path());
        let steps: Steps = Arc::default();
        Fixture {
            dir,
            endpoint,
            engine: FakeEngine {
                steps: steps.clone(),
                fail: false,
                stops: AtomicUsize::new(0),
                forward_to: None,
            },
            host: FakeHost {
                steps: steps.clone(),
                fail_loop: false,
                created: Mutex::new(None),
            },
            platform: FakePlatform(steps.clone()),
            steps,
        }
    }

    fn run(fx: &Fixture, spec: &WindowSpec, payload: ActivationPayload) -> Result<(), ActivationError> {
        let bootstrap = Bootstrap {
            engine: &fx.engine,
            host: &fx.host,
            platform: &fx.platform,
            engine_config: r#"{"network":"tcp"}"#,
            window: spec,
        };
        bootstrap.run(FakeClaim(fx.endpoint.clone(), fx.steps.clone()), payload)
    }

    fn steps(fx: &Fixture) -> Vec<String> {
        fx.steps.lock().unwrap().clone()
    }

    fn spec() -> WindowSpec {
        WindowSpec::new("gopeed", (10, 10), (1280, 720))
    }

    #[test]
    fn test_primary_lifecycle_order() {
        let fx = fixture();

        run(&fx, &spec(), ActivationPayload::from_args(["gopeed://a"])).unwrap();

        assert_eq!(
            steps(&fx),
            vec![
                "console",
                "subsystem.enter",
                r#"engine.start {"network":"tcp"}"#,
                "window.create gopeed://a",
                "loop",
                "subsystem.exit",
                "engine.stop",
                "claim.release",
            ]
        );
    }

    #[test]
    fn test_link_forwarded_during_engine_start_reaches_window() {
        let mut fx = fixture();
        fx.engine.forward_to = Some(fx.endpoint.clone());

        run(&fx, &spec(), ActivationPayload::default()).unwrap();

        let steps = steps(&fx);
        assert_eq!(&steps[2..4], ["link.forwarded", r#"engine.start {"network":"tcp"}"#]);

        let window = fx.host.created.lock().unwrap().clone().unwrap();
        assert_eq!(*window.links.lock().unwrap(), vec!["gopeed://early".to_string()]);
    }

    #[test]
    fn test_channel_is_closed_after_run() {
        let fx = fixture();

        run(&fx, &spec(), ActivationPayload::default()).unwrap();

        let err = InstanceClient::connect(&fx.endpoint, Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, IpcError::NotRunning));
    }

    #[test]
    fn test_channel_failure_starts_no_engine() {
        let mut fx = fixture();
        fx.endpoint = Endpoint::new(
            &InstanceIdentity::new("gopeed", "cls"),
            &fx.dir.path().join("missing"),
        );

        let err = run(&fx, &spec(), ActivationPayload::default()).unwrap_err();

        assert!(matches!(err, ActivationError::ChannelFailed(_)));
        assert_eq!(
            steps(&fx),
            vec!["console", "subsystem.enter", "subsystem.exit", "claim.release"]
        );
    }

    #[test]
    fn test_window_failure_still_stops_engine() {
        let fx = fixture();
        let spec = WindowSpec::new("", (10, 10), (1280, 720));

        let err = run(&fx, &spec, ActivationPayload::default()).unwrap_err();

        assert!(matches!(err, ActivationError::WindowCreationFailed(_)));
        assert_eq!(fx.engine.stops.load(Ordering::SeqCst), 1);
        assert!(!steps(&fx).iter().any(|s| s.starts_with("loop")));
        assert!(steps(&fx).contains(&"subsystem.exit".to_string()));
    }

    #[test]
    fn test_engine_failure_creates_no_window() {
        let mut fx = fixture();
        fx.engine.fail = true;

        let err = run(&fx, &spec(), ActivationPayload::default()).unwrap_err();

        assert!(matches!(err, ActivationError::EngineStartFailed(_)));
        assert!(!steps(&fx).iter().any(|s| s.starts_with("window.create")));
        assert_eq!(fx.engine.stops.load(Ordering::SeqCst), 0);
        assert_eq!(steps(&fx).last().map(String::as_str), Some("claim.release"));
    }

    #[test]
    fn test_event_loop_failure_stops_engine() {
        let mut fx = fixture();
        fx.host.fail_loop = true;

        let err = run(&fx, &spec(), ActivationPayload::default()).unwrap_err();

        assert!(matches!(err, ActivationError::EventLoopFailed(_)));
        assert_eq!(fx.engine.stops.load(Ordering::SeqCst), 1);
    }
}
