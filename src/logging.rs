// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tracing subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LOG_FORMAT_ENV;

const DEFAULT_FILTER: &str = "info,tower_http=debug";

/// Install the global tracing subscriber.
///
/// `LOG_FORMAT=json` selects structured JSON lines, anything else the
/// human-readable format. `RUST_LOG` overrides the default filter.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = fmt().with_env_filter(filter).with_target(true);
    // A subscriber may already be installed (tests, embedding).
    let _ = if json {
        builder.json().flatten_event(true).try_init()
    } else {
        builder.try_init()
    };
}
