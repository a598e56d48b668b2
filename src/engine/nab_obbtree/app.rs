use std::fmt::Debug;
use std::process::ExitCode;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::OnceLock;

#[macro_export]
macro_rules! iif_debug {
    ($a:expr, $b:expr) =>
    {
        match cfg!(debug_assertions)
        {
            true => $a,
            false => $b,
        }
    };
}

// crates whose log output is raised to the app level
const WORKSPACE_CRATES: [&str; 3] =
[
    "containers_obbtree",
    "math_obbtree",
    "nab_obbtree",
];

fn join_display<I>(separator: &str, iter: I) -> String
where I: Iterator,
      I::Item: std::fmt::Display
{
    let mut out = String::new();
    let mut first = true;
    for i in iter
    {
        match first
        {
            true => { first = false; }
            false => { out.push_str(separator); }
        };
        out.push_str(i.to_string().as_str());
    }
    out
}

pub trait CliArgs: clap::Parser + Debug { }
impl<T: clap::Parser + Debug> CliArgs for T { }

fn crate_name<T>() -> &'static str // hacky
{
    let name = std::any::type_name::<T>();
    match name.find("::")
    {
        Some(i) => &name[0..i],
        None => name,
    }
}

#[derive(Debug)]
pub struct AppRun<TCliArgs: CliArgs>
{
    pub app_name: &'static str,
    pub version_str: &'static str,

    pub start_time: chrono::DateTime<chrono::Local>,
    pub args: TCliArgs,
    pub pid: u32,

    exit_reason: AtomicI32,
}
impl<TCliArgs: CliArgs> AppRun<TCliArgs>
{
    pub fn startup(app_name: &'static str, app_version: &'static str) -> Self
    {
        let args = TCliArgs::parse();
        Self::startup_with_args(app_name, app_version, args)
    }

    pub fn startup_with_args(app_name: &'static str, app_version: &'static str, args: TCliArgs) -> Self
    {
        let default_log_levels = iif_debug!(
            (log::LevelFilter::Warn, log::LevelFilter::Debug),
            (log::LevelFilter::Warn, log::LevelFilter::Info));
        let app_crate = crate_name::<TCliArgs>();

        let mut builder = colog::basic_builder();
        builder
            .filter_level(default_log_levels.0)
            .filter_module(app_crate, default_log_levels.1);
        for module in WORKSPACE_CRATES
        {
            builder.filter_module(module, default_log_levels.1);
        }
        // a second startup (e.g. from tests) keeps the first logger
        let _ = builder.parse_default_env().try_init();

        let app_run = Self
        {
            app_name,
            version_str: app_version,
            start_time: chrono::Local::now(),
            args,
            pid: std::process::id(),
            exit_reason: AtomicI32::new(ExitReason::NormalExit as i32),
        };

        log::info!(target: app_crate,
            "=== Starting {} v{} [{}] (PID {}) at {} ===",
            app_run.app_name,
            app_run.version_str,
            join_display(" ", std::env::args()),
            app_run.pid,
            app_run.start_time);

        app_run
    }

    pub fn set_exit_reason(&self, exit_reason: ExitReason)
    {
        self.exit_reason.store(exit_reason as i32, Ordering::SeqCst);
    }
    pub fn get_exit_reason(&self) -> ExitReason
    {
        ExitReason::from_i32(self.exit_reason.load(Ordering::SeqCst))
    }
}
impl<TCliArgs: CliArgs> Drop for AppRun<TCliArgs>
{
    fn drop(&mut self)
    {
        log::info!(target: "app",
            "Exiting {} (PID {}) at {} with reason {:?}",
            self.app_name,
            self.pid,
            chrono::Local::now(),
            self.get_exit_reason());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitReason
{
    Unset = !1, // this should never be set
    NormalExit = 0,
    ValidationFailed = 2,
    BadConfig = 3,
    Panic = -99,
}
impl ExitReason
{
    fn from_i32(value: i32) -> Self
    {
        match value
        {
            0 => Self::NormalExit,
            2 => Self::ValidationFailed,
            3 => Self::BadConfig,
            -99 => Self::Panic,
            _ => Self::Unset,
        }
    }
}
impl std::process::Termination for ExitReason
{
    fn report(self) -> ExitCode
    {
        (self as u8).into()
    }
}

pub trait FatalErrorCode: Debug
{
    fn error_code(&self) -> u16;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FatalError
{
    Panic = 0,
    Memory,
}
impl FatalError
{
    #[inline] #[must_use]
    pub const fn short_name(self) -> &'static str
    {
        match self
        {
            Self::Panic => "PNC",
            Self::Memory => "MEM",
        }
    }
}

pub static FATAL_ERROR_CB: OnceLock<fn(&str)> = OnceLock::new();

// Exit the process with a fatal error
pub fn fatal_error(fatal_error: FatalError, code: impl FatalErrorCode) -> !
{
    let mut error_msg = format!("{}-{:04X}", fatal_error.short_name(), code.error_code());
    if cfg!(debug_assertions)
    {
        error_msg.push_str(&format!("\n\n{:#?}", &code));
    }

    log::error!("!!! FATAL: {}", error_msg);
    if let Some(error_cb) = FATAL_ERROR_CB.get()
    {
        error_cb(&error_msg);
    }

    log::error!("Exiting (PID {}) at {} with reason {:?}",
              std::process::id(),
              chrono::Local::now(),
              ExitReason::Panic);

    std::process::exit(ExitReason::Panic as i32)
}
