//! VCD waveform sink.
//!
//! Two-phase like the tracers of compiled-design toolchains: designs
//! register their signals first, then the sink opens its output file and
//! writes the header. Registering a signal after the header has been
//! written is forbidden, which is why the bench refuses late design
//! registration once a sink exists.
//!
//! Every dump is followed by a flush, so an interrupted run still leaves a
//! readable file behind.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use takt_common::signal::Net;
use thiserror::Error;
use tracing::debug;

/// Trace sink I/O errors.
#[derive(Debug, Error)]
pub enum TraceError {
    /// Underlying file operation failed.
    #[error("trace file error: {0}")]
    Io(#[from] std::io::Error),
}

struct TracedSignal {
    scope: String,
    name: String,
    width: u32,
    id: String,
    sample: Box<dyn Fn() -> u64>,
}

/// Value-change-dump writer with a fixed 1 ps timescale.
pub struct VcdTracer {
    signals: Vec<TracedSignal>,
    last: Vec<Option<u64>>,
    out: Option<BufWriter<File>>,
}

impl VcdTracer {
    /// Create an empty, closed sink.
    pub fn new() -> Self {
        Self {
            signals: Vec::new(),
            last: Vec::new(),
            out: None,
        }
    }

    /// True once the output file has been opened.
    pub fn is_open(&self) -> bool {
        self.out.is_some()
    }

    /// Number of registered signals.
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    /// Register a single-bit signal under `scope`.
    pub fn add_bit(&mut self, scope: &str, name: &str, net: &Net<u8>) {
        let net = net.clone();
        self.add_sampled(scope, name, 1, Box::new(move || u64::from(net.get())));
    }

    /// Register a multi-bit signal under `scope`.
    pub fn add_vec<T>(&mut self, scope: &str, name: &str, width: u32, net: &Net<T>)
    where
        T: Copy + Into<u64> + 'static,
    {
        let net = net.clone();
        self.add_sampled(scope, name, width, Box::new(move || net.get().into()));
    }

    fn add_sampled(&mut self, scope: &str, name: &str, width: u32, sample: Box<dyn Fn() -> u64>) {
        if self.is_open() {
            panic!(
                "trace::add: signal '{scope}.{name}' registered after the \
                 trace file was opened"
            );
        }
        let id = identifier(self.signals.len());
        self.signals.push(TracedSignal {
            scope: scope.to_string(),
            name: name.to_string(),
            width,
            id,
            sample,
        });
        self.last.push(None);
    }

    /// Write the VCD header to `path`. No signals may be added afterwards.
    ///
    /// # Errors
    ///
    /// Returns `TraceError::Io` when the file cannot be created or written.
    pub fn open(&mut self, path: &Path) -> Result<(), TraceError> {
        debug!(path = %path.display(), signals = self.signals.len(), "opening trace file");
        let mut out = BufWriter::new(File::create(path)?);

        writeln!(out, "$version takt trace sink $end")?;
        writeln!(out, "$timescale 1 ps $end")?;

        // One module scope per distinct registration scope, in first-seen
        // order.
        let mut scopes: Vec<&str> = Vec::new();
        for sig in &self.signals {
            if !scopes.contains(&sig.scope.as_str()) {
                scopes.push(&sig.scope);
            }
        }
        for scope in scopes {
            writeln!(out, "$scope module {scope} $end")?;
            for sig in self.signals.iter().filter(|s| s.scope == scope) {
                writeln!(out, "$var wire {} {} {} $end", sig.width, sig.id, sig.name)?;
            }
            writeln!(out, "$upscope $end")?;
        }
        writeln!(out, "$enddefinitions $end")?;

        self.out = Some(out);
        Ok(())
    }

    /// Emit a sample at `time_ps`. The first dump records every signal;
    /// later dumps record changes only.
    ///
    /// # Errors
    ///
    /// Returns `TraceError::Io` on write failure.
    pub fn dump(&mut self, time_ps: u64) -> Result<(), TraceError> {
        let out = self
            .out
            .as_mut()
            .unwrap_or_else(|| panic!("trace::dump: sink not open"));

        writeln!(out, "#{time_ps}")?;
        let initial = self.last.iter().all(Option::is_none);
        if initial {
            writeln!(out, "$dumpvars")?;
        }
        for (sig, last) in self.signals.iter().zip(self.last.iter_mut()) {
            let value = (sig.sample)();
            if initial || *last != Some(value) {
                if sig.width == 1 {
                    writeln!(out, "{}{}", value & 1, sig.id)?;
                } else {
                    writeln!(out, "b{value:b} {}", sig.id)?;
                }
                *last = Some(value);
            }
        }
        if initial {
            writeln!(out, "$end")?;
        }
        Ok(())
    }

    /// Flush buffered output to disk.
    ///
    /// # Errors
    ///
    /// Returns `TraceError::Io` on flush failure.
    pub fn flush(&mut self) -> Result<(), TraceError> {
        if let Some(out) = self.out.as_mut() {
            out.flush()?;
        }
        Ok(())
    }
}

impl Default for VcdTracer {
    fn default() -> Self {
        Self::new()
    }
}

/// Short printable identifier for signal `index`, VCD style.
fn identifier(index: usize) -> String {
    const FIRST: u8 = b'!';
    const RADIX: usize = 94; // printable ASCII '!'..='~'
    let mut index = index;
    let mut id = String::new();
    loop {
        id.push((FIRST + (index % RADIX) as u8) as char);
        index /= RADIX;
        if index == 0 {
            break;
        }
        index -= 1;
    }
    id
}
