// ---------------------------------------------------------------------------
// NdjsonTransport -- one JSON-RPC reply per line
// ---------------------------------------------------------------------------
//
// Replies carry either `result` or `error`, never both. Output goes to any
// `Write` sink; the binary uses stdout and tests use an in-memory buffer.
// ---------------------------------------------------------------------------

use std::io::{self, Write};

use serde::Serialize;

#[derive(Serialize)]
struct Reply {
	jsonrpc: &'static str,
	id: u64,
	#[serde(flatten)]
	outcome: Outcome,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Outcome {
	Result(serde_json::Value),
	Error(ErrorBody),
}

#[derive(Serialize)]
struct ErrorBody {
	code: i32,
	message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	data: Option<serde_json::Value>,
}

/// Writes replies to a line-oriented sink, flushing after each one.
pub struct NdjsonTransport {
	out: Box<dyn Write + Send>,
}

impl NdjsonTransport {
	pub fn new(out: Box<dyn Write + Send>) -> Self {
		Self { out }
	}

	pub fn stdout() -> Self {
		Self::new(Box::new(io::stdout()))
	}

	pub fn write_response(&mut self, id: u64, result: serde_json::Value) {
		self.send(Reply {
			jsonrpc: "2.0",
			id,
			outcome: Outcome::Result(result),
		});
	}

	pub fn write_error(
		&mut self,
		id: u64,
		code: i32,
		message: impl Into<String>,
		data: Option<serde_json::Value>,
	) {
		self.send(Reply {
			jsonrpc: "2.0",
			id,
			outcome: Outcome::Error(ErrorBody {
				code,
				message: message.into(),
				data,
			}),
		});
	}

	fn send(&mut self, reply: Reply) {
		let mut line = match serde_json::to_vec(&reply) {
			Ok(line) => line,
			Err(e) => {
				tracing::error!(id = reply.id, "failed to serialize reply: {}", e);
				return;
			}
		};
		line.push(b'\n');
		if let Err(e) = self.out.write_all(&line).and_then(|()| self.out.flush()) {
			tracing::error!(id = reply.id, "failed to write reply: {}", e);
		}
	}
}
