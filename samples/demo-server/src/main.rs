// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! This demo builds a small address space and watches it through the engine:
//!
//! 1. A `MyDevices` folder holds a counter that increments every 500ms, a writable variable and
//!    a free memory reading.
//! 2. A subscription monitors the counter and prints every notification and keep-alive.
//! 3. After the requested run time the subscription is deleted, the product name of the server is
//!    resolved by browse path and the session is closed.
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

#[macro_use]
extern crate log;

use opcua_engine::{prelude::*, sync::*, trace_lock, trace_read_lock};
use tokio::{sync::mpsc, task::JoinHandle, time};

const DEMO_NAMESPACE: &str = "urn:demo-server:devices";

struct Args {
    help: bool,
    config: Option<PathBuf>,
    duration: u64,
    publishing_interval: f64,
    sampling_interval: f64,
}

impl Args {
    pub fn parse_args() -> Result<Args, Box<dyn std::error::Error>> {
        let mut args = pico_args::Arguments::from_env();
        Ok(Args {
            help: args.contains(["-h", "--help"]),
            config: args.opt_value_from_str("--config")?,
            duration: args.opt_value_from_str("--duration")?.unwrap_or(10),
            publishing_interval: args
                .opt_value_from_str("--publishing-interval")?
                .unwrap_or(1000f64),
            sampling_interval: args
                .opt_value_from_str("--sampling-interval")?
                .unwrap_or(100f64),
        })
    }

    pub fn usage() {
        println!(
            r#"Demo Server
Usage:
  -h, --help                    Show help
  --config [path]               Server configuration to load (default: built in)
  --duration [secs]             How long to run the subscription (default: 10)
  --publishing-interval [ms]    Publishing interval of the subscription (default: 1000)
  --sampling-interval [ms]      Sampling interval of the counter (default: 100)"#
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), ()> {
    let args = Args::parse_args().map_err(|_| Args::usage())?;
    if args.help {
        Args::usage();
        return Ok(());
    }

    opcua_engine::console_logging::init_with_default_filter("info");

    let config = match args.config {
        Some(ref path) => ServerConfig::load::<ServerConfig>(path).map_err(|_| {
            error!("Cannot load configuration from {}", path.display());
        })?,
        None => ServerConfig::new("Demo Server"),
    };
    if !config.is_valid() {
        error!("Configuration is invalid");
        return Err(());
    }

    let (address_space, counter_id, counter) =
        make_address_space(&config).map_err(|status_code| {
            error!("Cannot build the address space, {}", status_code);
        })?;
    let counter_task = spawn_counter(counter);

    let cache = SubscriptionCache::new(address_space.clone(), config.limits.clone());
    let (session, receiver) = cache.create_session(1).map_err(|_| ())?;
    let printer = spawn_printer(receiver);

    let subscription_id = {
        let mut session = trace_lock!(session);
        let response = session
            .create_subscription(&CreateSubscriptionRequest {
                requested_publishing_interval: args.publishing_interval,
                requested_lifetime_count: 100,
                requested_max_keep_alive_count: 10,
                ..Default::default()
            })
            .map_err(|status_code| {
                error!("Cannot create subscription, {}", status_code);
            })?;
        println!(
            "Subscription {} publishing every {}ms",
            response.subscription_id, response.revised_publishing_interval
        );
        let results = session
            .create_monitored_items(
                response.subscription_id,
                TimestampsToReturn::Both,
                &[MonitoredItemCreateRequest::new(
                    counter_id.into(),
                    MonitoringMode::Reporting,
                    MonitoringParameters {
                        client_handle: 1,
                        sampling_interval: args.sampling_interval,
                        queue_size: 10,
                        ..Default::default()
                    },
                )],
            )
            .map_err(|status_code| {
                error!("Cannot monitor the counter, {}", status_code);
            })?;
        println!(
            "Monitoring MyVariable1, sampling every {}ms, queue size {}, status {}",
            results[0].revised_sampling_interval,
            results[0].revised_queue_size,
            results[0].status_code
        );
        response.subscription_id
    };

    time::sleep(Duration::from_secs(args.duration)).await;

    let statuses = trace_lock!(session)
        .delete_subscriptions(&[subscription_id])
        .map_err(|_| ())?;
    println!("Subscription {} deleted, {}", subscription_id, statuses[0]);

    print_product_name(&*trace_read_lock!(address_space), &config.limits.operational);

    counter_task.abort();
    let _ = cache.close_session(1);
    drop(session);
    let _ = printer.await;
    Ok(())
}

/// Creates the address space of the demo. `MyVariable1` reads the counter through a getter, so
/// a change is only seen when the variable is sampled.
fn make_address_space(
    config: &ServerConfig,
) -> Result<(Arc<RwLock<AddressSpace>>, NodeId, Arc<AtomicU32>), StatusCode> {
    let mut address_space = AddressSpace::from_config(config);
    let ns = address_space.register_namespace(DEMO_NAMESPACE)?;

    let devices_id = NodeId::new(ns, "MyDevices");
    FolderBuilder::new(&devices_id, "MyDevices", "My Devices")
        .organized_by(NodeId::objects_folder_id())
        .insert(&mut address_space)?;

    let counter = Arc::new(AtomicU32::new(1));
    let counter_id = NodeId::new(ns, "MyVariable1");
    VariableBuilder::new(&counter_id, "MyVariable1", "MyVariable1")
        .component_of(devices_id.clone())
        .data_type(DataTypeId::Double)
        .value_getter({
            let counter = counter.clone();
            AttrFnGetter::new_boxed(move |_, _| {
                Ok(Some(DataValue::new_now(counter.load(Ordering::SeqCst) as f64)))
            })
        })
        .insert(&mut address_space)?;

    VariableBuilder::new(&NodeId::new(ns, "MyVariable2"), "MyVariable2", "MyVariable2")
        .component_of(devices_id.clone())
        .value(10f64)
        .writable()
        .insert(&mut address_space)?;

    VariableBuilder::new(&NodeId::new(ns, "FreeMemory"), "FreeMemory", "Free Memory")
        .component_of(devices_id)
        .data_type(DataTypeId::Double)
        .value_getter(AttrFnGetter::new_boxed(|_, _| {
            Ok(Some(DataValue::new_now(free_memory_percent())))
        }))
        .insert(&mut address_space)?;

    Ok((Arc::new(RwLock::new(address_space)), counter_id, counter))
}

/// Available memory as a percentage of total memory, 0 where it cannot be read
fn free_memory_percent() -> f64 {
    let meminfo = match std::fs::read_to_string("/proc/meminfo") {
        Ok(meminfo) => meminfo,
        Err(_) => return 0f64,
    };
    let field = |name: &str| {
        meminfo
            .lines()
            .find(|line| line.starts_with(name))
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|kb| kb.parse::<f64>().ok())
    };
    match (field("MemAvailable:"), field("MemTotal:")) {
        (Some(available), Some(total)) if total > 0f64 => available / total * 100f64,
        _ => 0f64,
    }
}

/// Increments the counter every 500ms
fn spawn_counter(counter: Arc<AtomicU32>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = time::interval(Duration::from_millis(500));
        loop {
            timer.tick().await;
            counter.fetch_add(1, Ordering::SeqCst);
        }
    })
}

/// Prints every publish response until the session goes away
fn spawn_printer(mut receiver: mpsc::Receiver<PublishResponse>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(response) = receiver.recv().await {
            let message = &response.notification_message;
            if message.is_keep_alive() {
                println!(
                    "Subscription {} keep-alive, next sequence number {}",
                    response.subscription_id, message.sequence_number
                );
            } else if let Some(status) = message.status_change_status() {
                println!(
                    "Subscription {} status changed to {}",
                    response.subscription_id, status
                );
            } else {
                for notification in message.data_changes() {
                    println!(
                        "Subscription {} #{} item {} = {} ({})",
                        response.subscription_id,
                        message.sequence_number,
                        notification.client_handle,
                        notification.value.variant(),
                        notification.value.status()
                    );
                }
            }
        }
    })
}

fn print_product_name(address_space: &AddressSpace, operational_limits: &OperationalLimits) {
    let relative_path = match RelativePath::from_str(
        "/Objects/Server.ServerStatus.BuildInfo.ProductName",
        &RelativePathElement::default_node_resolver,
    ) {
        Ok(relative_path) => relative_path,
        Err(status_code) => {
            error!("Invalid browse path, {}", status_code);
            return;
        }
    };
    let browse_paths = [BrowsePath {
        starting_node: NodeId::root_folder_id(),
        relative_path,
    }];
    let result = view::translate_browse_paths_to_node_ids(
        address_space,
        operational_limits,
        &browse_paths,
    );
    match result.as_deref() {
        Ok([result]) if result.status_code.is_good() => {
            for target in &result.targets {
                let value = address_space
                    .get_variable_value(target.target_id.clone())
                    .map(|data_value| data_value.variant().to_string())
                    .unwrap_or_else(|status_code| status_code.to_string());
                println!("ProductName {} = {}", target.target_id, value);
            }
        }
        Ok(results) => println!("ProductName could not be resolved {:?}", results),
        Err(status_code) => println!("ProductName could not be resolved, {}", status_code),
    }
}
