//! Loopback upstreams for exercising the proxy without network access.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

/// Serves loopback connections on `127.0.0.1` from a background thread.
pub struct ScriptedUpstream {
  addr: SocketAddr,
  requests: Receiver<String>,
}

impl ScriptedUpstream {
  /// Reads one request head, answers with `response` verbatim, then closes.
  pub fn respond(response: &str) -> ScriptedUpstream {
    let response = response.as_bytes().to_vec();

    ScriptedUpstream::serve(bind_loopback(), 1, move |mut stream| {
      let _ = stream.write_all(&response);
      let _ = stream.flush();
    })
  }

  /// Reads one request head and then holds the connection open without
  /// answering.
  pub fn silent(hold_for: Duration) -> ScriptedUpstream {
    ScriptedUpstream::serve(bind_loopback(), 1, move |_stream| thread::sleep(hold_for))
  }

  /// Answers every connection with a `302` pointing back at itself.
  pub fn redirect_loop() -> ScriptedUpstream {
    let listener = bind_loopback();
    let addr = listener.local_addr().unwrap();
    let response = format!(
      "HTTP/1.1 302 Found\r\nLocation: http://{addr}/again\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    );

    ScriptedUpstream::serve(listener, usize::MAX, move |mut stream| {
      let _ = stream.write_all(response.as_bytes());
      let _ = stream.flush();
    })
  }

  fn serve<F>(listener: TcpListener, connections: usize, answer: F) -> ScriptedUpstream
  where
    F: Fn(TcpStream) + Send + 'static,
  {
    let addr = listener.local_addr().unwrap();
    let (sender, requests) = mpsc::channel();

    thread::spawn(move || {
      for stream in listener.incoming().take(connections) {
        let Ok(mut stream) = stream else { break };
        let _ = sender.send(read_request_head(&mut stream));
        answer(stream);
      }
    });

    ScriptedUpstream { addr, requests }
  }

  pub fn addr(&self) -> SocketAddr {
    self.addr
  }

  /// The request head the upstream received.
  pub fn request(&self) -> String {
    self.requests.recv_timeout(Duration::from_secs(5)).unwrap()
  }
}

fn read_request_head(stream: &mut TcpStream) -> String {
  let mut head = Vec::new();
  let mut buffer = [0_u8; 1024];

  while !head.windows(4).any(|window| window == b"\r\n\r\n") {
    match stream.read(&mut buffer) {
      Ok(0) | Err(_) => break,
      Ok(read) => head.extend_from_slice(&buffer[..read]),
    }
  }

  String::from_utf8_lossy(&head).into_owned()
}

fn bind_loopback() -> TcpListener {
  TcpListener::bind("127.0.0.1:0").unwrap()
}

/// A loopback port nothing listens on.
pub fn closed_port() -> u16 {
  bind_loopback().local_addr().unwrap().port()
}
