//! Scripted in-process engine used by the unit tests.
//!
//! It drives the [`Transfer`] callbacks the way libcurl does: the whole
//! request body is pulled first, then the header lines arrive one per call,
//! then the body chunks. A callback answering with an unexpected count aborts
//! the perform with libcurl's write error code.

use bytes::{Bytes, BytesMut};

use super::{Engine, EngineHandle, HandleOption, Transfer};
use crate::protocol::{EngineError, NetworkError};

pub(crate) const WRITE_ERROR: i32 = NetworkError::WRITE_ERROR;

#[derive(Debug, Clone)]
pub(crate) struct Script {
    pub status: u16,
    pub headers: Vec<String>,
    pub body: Vec<Bytes>,
    /// Answer with the uploaded request body instead of `body`
    pub echo: bool,
    pub read_chunk: usize,
    /// Finish the body with a zero length write
    pub end_with_empty_write: bool,
    /// Fail before any callback runs, like a refused connection
    pub failure: Option<EngineError>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
            echo: false,
            read_chunk: 16 * 1024,
            end_with_empty_write: false,
            failure: None,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeHandle {
    pub script: Script,
    pub options: Vec<HandleOption>,
    pub installed_headers: Option<Vec<String>>,
    pub header_installs: Vec<Vec<String>>,
    pub header_releases: usize,
    pub double_releases: usize,
    pub uploaded: BytesMut,
    pub read_calls: usize,
    pub performs: usize,
}

impl FakeHandle {
    pub fn with_script(script: Script) -> Self {
        Self { script, ..Self::default() }
    }

    /// The most recently set value of an option, compared by variant.
    pub fn last_option(&self, name: &str) -> Option<&HandleOption> {
        self.options.iter().rev().find(|option| option.name() == name)
    }

    fn posts_body(&self) -> bool {
        matches!(self.last_option("post"), Some(HandleOption::Post(true)))
    }
}

impl EngineHandle for FakeHandle {
    fn set_option(&mut self, option: HandleOption) -> Result<(), EngineError> {
        self.options.push(option);
        Ok(())
    }

    fn set_headers(&mut self, lines: &[String]) -> Result<(), EngineError> {
        self.installed_headers = Some(lines.to_vec());
        self.header_installs.push(lines.to_vec());
        Ok(())
    }

    fn clear_headers(&mut self) {
        match self.installed_headers.take() {
            Some(_) => self.header_releases += 1,
            None => self.double_releases += 1,
        }
    }

    fn perform(&mut self, transfer: &mut dyn Transfer) -> Result<(), EngineError> {
        self.performs += 1;
        self.uploaded.clear();
        if let Some(failure) = self.script.failure.clone() {
            return Err(failure);
        }

        if self.posts_body() {
            let mut buf = vec![0u8; self.script.read_chunk];
            loop {
                self.read_calls += 1;
                let count = transfer.read(&mut buf);
                if count == 0 {
                    break;
                }
                self.uploaded.extend_from_slice(&buf[..count]);
            }
        }

        let status = self.script.status;
        let mut lines = vec![format!("HTTP/1.1 {status} Fake\r\n")];
        lines.extend(self.script.headers.iter().map(|header| format!("{header}\r\n")));
        lines.push("\r\n".to_string());
        for line in &lines {
            if transfer.header(line.as_bytes()) != line.len() {
                return Err(EngineError::new(WRITE_ERROR, "Failed writing header"));
            }
        }

        let body = if self.script.echo { vec![self.uploaded.clone().freeze()] } else { self.script.body.clone() };
        for chunk in body.iter().filter(|chunk| !chunk.is_empty()) {
            if transfer.write(chunk, status) != chunk.len() {
                return Err(EngineError::new(WRITE_ERROR, "Failure writing output to destination"));
            }
        }
        if self.script.end_with_empty_write {
            transfer.write(&[], status);
        }
        Ok(())
    }

    fn response_code(&mut self) -> Result<u16, EngineError> {
        Ok(if self.performs == 0 { 0 } else { self.script.status })
    }
}

/// Hands out fake handles, or fails like an engine out of resources.
#[derive(Debug, Default)]
pub(crate) struct FakeEngine {
    pub script: Script,
    pub fail: bool,
}

impl Engine for FakeEngine {
    type Handle = FakeHandle;

    fn create_handle(&self) -> Result<FakeHandle, EngineError> {
        if self.fail {
            return Err(EngineError::new(2, "Failed initialization"));
        }
        Ok(FakeHandle::with_script(self.script.clone()))
    }
}
