// src/bin/client.rs
// One-shot request sender: prints the server's JSON reply line.
//
//   client <addr> GET <resource>/<key>
//   client <addr> METRICS

use anyhow::{bail, Result};

use cachecluster::wire;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (addr, request) = match args.as_slice() {
        [addr, cmd] if cmd == "METRICS" => (addr.clone(), "METRICS".to_string()),
        [addr, cmd, path] if cmd == "GET" => (addr.clone(), format!("GET {path}")),
        _ => bail!("usage: client <addr> GET <resource>/<key> | client <addr> METRICS"),
    };

    match wire::send_line(&addr, &request).await {
        Ok(reply) => {
            println!("{reply}");
            Ok(())
        }
        Err(_) => {
            println!(r#"{{"status": "CLIENT_CONNECTION_ERROR", "data": null}}"#);
            std::process::exit(1);
        }
    }
}
