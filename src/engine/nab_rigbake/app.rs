use std::fmt::Debug;
use std::io::Read;
use std::process::ExitCode;
use std::sync::atomic::{AtomicI32, Ordering};

// every crate in the workspace gets the verbose app log level
const WORKSPACE_CRATES: &[&str] =
&[
    "nab_rigbake",
    "math_rigbake",
    "scene_rigbake",
    "assets_rigbake",
    "bake_rigbake",
];

fn join_args<I>(separator: &str, iter: I) -> String
where I: Iterator,
      I::Item: std::fmt::Display
{
    let mut out = String::new();
    for (i, arg) in iter.enumerate()
    {
        if i > 0
        {
            out.push_str(separator);
        }
        out.push_str(&arg.to_string());
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
        Some(end) => &name[0..end],
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
    pub is_elevated: bool,

    exit_reason: AtomicI32,
}
impl<TCliArgs: CliArgs> AppRun<TCliArgs>
{
    pub fn startup(app_name: &'static str, app_version: &'static str) -> Self
    {
        #[cfg(debug_assertions)]
        let default_log_levels = (log::LevelFilter::Warn, log::LevelFilter::Debug);
        #[cfg(not(debug_assertions))]
        let default_log_levels = (log::LevelFilter::Warn, log::LevelFilter::Info);
        let app_crate = crate_name::<TCliArgs>();

        let mut builder = colog::basic_builder();
        builder
            .filter_level(default_log_levels.0)
            .filter_module(app_crate, default_log_levels.1);
        for workspace_crate in WORKSPACE_CRATES
        {
            builder.filter_module(workspace_crate, default_log_levels.1);
        }
        builder
            .parse_default_env()
            .init();

        let app_run = Self
        {
            app_name,
            version_str: app_version,
            start_time: chrono::Local::now(),
            args: TCliArgs::parse(),
            pid: std::process::id(),
            is_elevated: is_root::is_root(),
            exit_reason: AtomicI32::new(ExitReason::NormalExit as i32),
        };

        log::info!(target: app_crate,
            "=== Starting {} v{} [{}] (PID {}){} at {} ===",
            app_run.app_name,
            app_run.version_str,
            join_args(" ", std::env::args()),
            app_run.pid,
            if app_run.is_elevated { " elevated" } else { "" },
            app_run.start_time);

        app_run
    }

    pub fn set_exit_reason(&self, exit_reason: ExitReason)
    {
        self.exit_reason.store(exit_reason as i32, Ordering::SeqCst);
    }
    pub fn get_exit_reason(&self) -> ExitReason
    {
        ExitReason::from(self.exit_reason.load(Ordering::SeqCst))
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
    // some inputs failed to bake, the rest were written
    PartialFailure = 1,
    InvalidArgs = 2,
    Panic = -99,
}
impl From<i32> for ExitReason
{
    fn from(value: i32) -> Self
    {
        match value
        {
            0 => ExitReason::NormalExit,
            1 => ExitReason::PartialFailure,
            2 => ExitReason::InvalidArgs,
            -99 => ExitReason::Panic,
            _ => ExitReason::Unset,
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

/// Only a panic on the main thread takes the process down; other threads unwind to whoever owns them
fn exits_on_panic(thread: &std::thread::Thread) -> bool
{
    thread.name() == Some("main")
}

pub fn set_panic_hook(wait_for_exit: bool)
{
    let default_panic_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic|
    {
        default_panic_hook(panic);

        if !exits_on_panic(&std::thread::current())
        {
            return;
        }

        if wait_for_exit
        {
            print!("Press any key to exit... ");
            let mut input = [0u8];
            let _ = std::io::stdin().read(&mut input);
        }

        eprintln!("Exiting (PID {}) at {} with reason {:?}",
                  std::process::id(),
                  chrono::Local::now(),
                  ExitReason::Panic);

        std::process::exit(ExitReason::Panic as i32)
    }));
}
