// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Console logger built on `env_logger`. Filtering is taken from the `RUST_OPCUA_LOG`
//! environment variable rather than `RUST_LOG` so other tools don't flood the console.

use std::{
    fmt,
    io::Write,
    sync::atomic::{AtomicBool, Ordering},
};

use env_logger::{fmt::Color, fmt::Formatter, Builder, Env};

const LOG_ENV_VAR: &str = "RUST_OPCUA_LOG";

struct Pad<T> {
    value: T,
    width: usize,
}

impl<T: fmt::Display> fmt::Display for Pad<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{: <width$}", self.value, width = self.width)
    }
}

fn format_record(f: &mut Formatter, record: &log::Record) -> std::io::Result<()> {
    let now = chrono::Utc::now();
    let time_fmt = now.format("%Y-%m-%d %H:%M:%S%.3f");

    let mut style = f.style();
    match record.metadata().level() {
        log::Level::Error => {
            // White on red
            style.set_color(Color::White);
            style.set_bg(Color::Red);
        }
        log::Level::Warn => {
            style.set_color(Color::Yellow);
        }
        log::Level::Info => {
            style.set_color(Color::Cyan);
        }
        log::Level::Debug => {
            style.set_color(Color::Green);
        }
        log::Level::Trace => {
            // Grey
            style.set_color(Color::Ansi256(8));
        }
    }
    let level = style.value(Pad {
        value: record.level(),
        width: 5,
    });

    let mut style = f.style();
    let target = style.set_bold(true).value(Pad {
        value: record.target(),
        width: 48,
    });

    writeln!(f, "{} {} {} {}", time_fmt, level, target, record.args())
}

/// Initialises console logging with no filter unless `RUST_OPCUA_LOG` is set.
pub fn init() {
    init_with_default_filter("");
}

/// Initialises console logging, using `default_filter` (e.g. `"info"` or
/// `"opcua_engine::server::subscriptions=debug"`) when `RUST_OPCUA_LOG` is not set.
/// Only the first call has any effect.
pub fn init_with_default_filter(default_filter: &str) {
    lazy_static! {
        static ref INITIALISED: AtomicBool = AtomicBool::new(false);
    }

    if !INITIALISED.swap(true, Ordering::Relaxed) {
        let env = if default_filter.is_empty() {
            Env::new().filter(LOG_ENV_VAR)
        } else {
            Env::new().filter_or(LOG_ENV_VAR, default_filter)
        };
        let mut builder = Builder::from_env(env);
        builder.format(format_record);
        if builder.try_init().is_ok() {
            info!(
                "Logging is enabled, use {} environment variable to control filtering, logging level",
                LOG_ENV_VAR
            );
        }
    }
}
