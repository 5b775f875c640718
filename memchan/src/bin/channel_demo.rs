//! Channel CLI Demo
//!
//! Appends stdin lines to a shared buffer through one channel, then reads
//! them back through a second, independently positioned channel.
//! Run with `RUST_LOG=trace` to see every channel call.

use memchan::{Buffer, Channel, OpenOptions};
use std::io::{self, BufRead, Write as _};

/// Adapter so stdout can be a `transfer_to` sink
struct StdoutSink(io::Stdout);

impl embedded_io::ErrorType for StdoutSink {
    type Error = io::Error;
}

impl embedded_io::Write for StdoutSink {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.flush()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let buffer = Buffer::new();
    let writer = Channel::new(buffer.clone(), OpenOptions::new().append(true));
    let reader = Channel::new(buffer.clone(), OpenOptions::new().read(true));

    println!("Enter text (empty line to quit):");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        writer.write_vectored(&[trimmed.as_bytes(), b"\n"])?;
    }
    println!("Writer at position {}, store holds {} bytes", writer.position()?, buffer.len());
    writer.close()?;

    let mut line_buf = [0u8; 16];
    if let Some(n) = reader.read(&mut line_buf)? {
        println!("First {n} bytes: {:?}", String::from_utf8_lossy(&line_buf[..n]));
    }

    println!("Everything, via transfer_to:");
    let size = reader.size()?;
    let mut sink = StdoutSink(io::stdout());
    reader.transfer_to(0, size, &mut sink)?;
    embedded_io::Write::flush(&mut sink)?;

    let token = reader.lock(0, size, true)?;
    println!("Holding {token:?}");
    token.release();

    reader.close()?;
    println!("Reader closed, buffer still has {} handle(s)", buffer.handle_count());
    Ok(())
}
