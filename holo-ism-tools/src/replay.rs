//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use clap::{App, Arg};
use holo_ospf_ism::config::InstanceCfg;
use holo_ospf_ism::instance::Instance;
use holo_ospf_ism::output::ChannelOutput;
use holo_ospf_ism::tasks::messages::ProtocolInputMsg;
use tokio::sync::mpsc;
use tracing::info;

fn init_tracing() {
    // Logs go to stderr so they don't get mixed with the replay output.
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive("holo_ospf_ism=debug".parse().unwrap())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();
}

async fn replay(config: &InstanceCfg, filename: &str) {
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let (output_tx, mut output_rx) = mpsc::unbounded_channel();

    // Timers are recorded along with all other side effects instead of being
    // armed. Expirations, if wanted, must be present in the record file.
    let output = ChannelOutput::new(output_tx);
    let mut instance = Instance::new(
        "replay",
        config,
        Box::new(output.clone()),
        Box::new(output),
    );

    // Push events from the record file.
    for msg in std::fs::read_to_string(filename)
        .expect("Unable to read record file")
        .lines()
        .filter(|line| !line.trim().is_empty())
    {
        let msg: ProtocolInputMsg = serde_json::from_str(msg)
            .expect("Failed to parse instance message");
        input_tx.send(msg).expect("Failed to send instance message");
    }
    drop(input_tx);

    // Process all events.
    instance.run(input_rx).await;

    // Print the resulting side effects, one per line.
    while let Ok(msg) = output_rx.try_recv() {
        let msg = serde_json::to_string(&msg)
            .expect("Failed to serialize instance message");
        println!("{msg}");
    }

    info!(?instance, "replay finished");
}

#[tokio::main]
async fn main() {
    // Parse command-line parameters.
    let matches = App::new("Replay ISM events")
        .about("Replay OSPF interface events from a record file")
        .arg(
            Arg::with_name("CONFIG")
                .long("config")
                .help("Instance configuration file (TOML)")
                .value_name("CONFIG")
                .required(true),
        )
        .arg(
            Arg::with_name("FILENAME")
                .help("Events file path (one JSON message per line)")
                .required(true)
                .index(1),
        )
        .get_matches();
    let config = matches.value_of("CONFIG").unwrap();
    let filename = matches.value_of("FILENAME").unwrap();

    // Setup logging.
    init_tracing();

    // Load instance configuration.
    let config = std::fs::read_to_string(config)
        .expect("Unable to read configuration file");
    let config: InstanceCfg =
        toml::from_str(&config).expect("Failed to parse configuration file");

    // Replay events.
    replay(&config, filename).await;
}
