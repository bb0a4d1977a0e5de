// SPDX-License-Identifier: MIT OR Apache-2.0
//! The leash runtime, with a few demonstration entry points.

use leash_core::{Program, entry_point};
use leash_host::{AutoProcessKiller, LaunchBuilder};
use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

/// Prints a greeting for its first argument.
struct Greeter;

impl Program for Greeter {
    const NAME: &'static str = "demo.Greeter";

    fn main(args: Vec<String>) -> anyhow::Result<()> {
        let name = args.first().map_or("world", String::as_str);
        println!("Hello, {name}!");
        for extra in args.iter().skip(1) {
            println!("arg: {extra}");
        }
        Ok(())
    }
}

/// Sleeps for the given number of seconds (default 60).
struct Sleeper;

impl Program for Sleeper {
    const NAME: &'static str = "demo.Sleeper";

    fn main(args: Vec<String>) -> anyhow::Result<()> {
        let secs = match args.first() {
            Some(s) => s.parse()?,
            None => 60,
        };
        std::thread::sleep(Duration::from_secs(secs));
        Ok(())
    }
}

/// Always fails.
struct Fail;

impl Program for Fail {
    const NAME: &'static str = "demo.Fail";

    fn main(_args: Vec<String>) -> anyhow::Result<()> {
        anyhow::bail!("boom")
    }
}

/// Starts a [`Sleeper`] with auto-exit, prints its pid and waits for it.
struct Spawner;

impl Program for Spawner {
    const NAME: &'static str = "demo.Spawner";

    fn main(args: Vec<String>) -> anyhow::Result<()> {
        let killer = AutoProcessKiller::new()?;
        let child = LaunchBuilder::new::<Sleeper>()?
            .auto_exit(true)
            .args(args)
            .start()?;
        killer.add(&child);

        let mut stdout = std::io::stdout();
        writeln!(stdout, "{}", child.pid().unwrap_or_default())?;
        stdout.flush()?;

        let status = tokio::runtime::Handle::current().block_on(child.wait())?;
        anyhow::ensure!(status.success(), "sleeper failed: {status}");
        Ok(())
    }
}

entry_point!(Greeter);
entry_point!(Sleeper);
entry_point!(Fail);
entry_point!(Spawner);

fn main() -> ExitCode {
    leash_runtime::main()
}
