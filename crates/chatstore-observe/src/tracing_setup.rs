//! Tracing subscriber initialization with structured logging and optional
//! OpenTelemetry trace export.
//!
//! # Usage
//!
//! ```no_run
//! use chatstore_observe::tracing_setup::{init_tracing, TracingOptions};
//!
//! // Plain logs at info unless RUST_LOG says otherwise
//! init_tracing(TracingOptions::default()).unwrap();
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use std::sync::OnceLock;

/// Stores the OTel tracer provider so it can be shut down cleanly on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// How the global subscriber is assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingOptions {
    /// Filter directive used when `RUST_LOG` is unset.
    pub default_directive: String,
    /// Emit one JSON object per event instead of human-readable lines.
    pub json: bool,
    /// Bridge spans to OpenTelemetry with a stdout exporter.
    pub otel: bool,
}

impl Default for TracingOptions {
    fn default() -> Self {
        Self {
            default_directive: "info".to_string(),
            json: false,
            otel: false,
        }
    }
}

impl TracingOptions {
    /// Options for a CLI `-v` count: 0 = info, 1 = debug, 2+ = trace.
    pub fn from_verbosity(verbose: u8, json: bool) -> Self {
        let level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        // sqlx logs every statement at info; keep it quiet unless tracing.
        let default_directive = if verbose >= 2 {
            level.to_string()
        } else {
            format!("{level},sqlx=warn")
        };
        Self {
            default_directive,
            json,
            otel: false,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// - Installs a `fmt` layer (plain or JSON) with target visibility and span
///   close timing.
/// - When `options.otel` is set, additionally bridges tracing spans to
///   OpenTelemetry using a stdout exporter.
/// - Respects `RUST_LOG`; falls back to `options.default_directive`.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set or the
/// default directive does not parse.
pub fn init_tracing(options: TracingOptions) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&options.default_directive)?,
    };

    let json_layer = options.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
    });
    let plain_layer = (!options.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
    });

    let otel_layer = if options.otel {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("chatstore");

        // Store the provider for shutdown and register it globally.
        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);

        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(plain_layer)
        .with(otel_layer)
        .try_init()?;

    Ok(())
}

/// Flush pending traces and shut down the OpenTelemetry tracer provider.
///
/// Safe to call even when OTel was not enabled (no-op in that case).
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}
