// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio::time::sleep;

use crate::error::Fallible;
use crate::error::fail;

/// How long to wait for a freshly spawned server to accept connections.
const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn wait_for_server(host: &str, port: u16) -> Fallible<()> {
    let deadline = Instant::now() + STARTUP_TIMEOUT;
    loop {
        if let Ok(stream) = TcpStream::connect(format!("{host}:{port}")).await {
            drop(stream);
            return Ok(());
        }
        if Instant::now() >= deadline {
            return fail(format!("server on {host}:{port} did not start"));
        }
        sleep(Duration::from_millis(1)).await;
    }
}
