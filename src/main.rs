use std::sync::Arc;
use std::thread;

use log::{error, info};
use structopt::StructOpt;

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

#[macro_use]
extern crate num_derive;

mod cflowd;
mod cli;
mod context;
mod decoder;
mod error;
mod flow;
mod queue;
mod receiver;
mod signals;
mod template_cache;
mod writer;

use cli::{OutputFormat, Opts, PortSpec};
use context::{DaemonContext, WorkerSnapshot};
use decoder::{Decoder, OutputAccumulator, OutputFormats};
use queue::BatchQueue;
use receiver::{Datagram, Receiver};
use template_cache::EnterpriseBitConfig;
use writer::Writer;

/// Wires one configured port's full pipeline: a `Receiver` thread, a decode
/// thread that drains Q1 and feeds the configured writer queues, and one
/// `Writer` thread per output format.
fn spawn_port_pipeline(spec: PortSpec, ctx: Arc<DaemonContext>, log_missing_full: bool, log_unchanged_templates: bool) -> Vec<thread::JoinHandle<()>> {
    let mut handles = Vec::new();

    let q1 = Arc::new(BatchQueue::<Datagram>::new());
    let free_return = Arc::new(BatchQueue::<receiver::Buffer>::new());
    let stop = ctx.stop_flag();

    ctx.register_port(spec.port);

    let want_cflowd = spec.formats.contains(&OutputFormat::Cflowd);
    let want_ipfix = spec.formats.contains(&OutputFormat::Ipfix);

    let q2_cflowd = want_cflowd.then(|| Arc::new(BatchQueue::<Vec<u8>>::new()));
    let q2_ipfix = want_ipfix.then(|| Arc::new(BatchQueue::<Vec<u8>>::new()));

    {
        let q1_status = Arc::clone(&q1);
        let q2_status = q2_cflowd.clone().or_else(|| q2_ipfix.clone());
        let port = spec.port;
        ctx.register_status_provider(move || WorkerSnapshot {
            port,
            q1_depth: q1_status.len(),
            q2_depth: q2_status.as_ref().map(|q| q.len()).unwrap_or(0),
        });
    }

    let receiver_port = spec.port;
    let q1_for_receiver = Arc::clone(&q1);
    let free_return_for_receiver = Arc::clone(&free_return);
    let stop_for_receiver = Arc::clone(&stop);
    match Receiver::bind(receiver_port, receiver::DEFAULT_POOL_SIZE, receiver::DEFAULT_POOL_SIZE, q1_for_receiver, free_return_for_receiver, stop_for_receiver) {
        Ok(mut r) => {
            handles.push(
                thread::Builder::new()
                    .name(format!("Receiver-{}", receiver_port))
                    .spawn(move || r.run())
                    .expect("spawn receiver thread"),
            );
        }
        Err(e) => {
            error!("failed to bind port {}: {}", receiver_port, e);
            ctx.bump_exit_code(1);
            return handles;
        }
    }

    let decode_port = spec.port;
    let q2_cflowd_for_decode = q2_cflowd.clone();
    let q2_ipfix_for_decode = q2_ipfix.clone();
    handles.push(
        thread::Builder::new()
            .name(format!("Decoder-{}", decode_port))
            .spawn(move || {
                let formats = OutputFormats { cflowd: want_cflowd, ipfix: want_ipfix };
                let mut decoder = Decoder::new(formats, EnterpriseBitConfig::default(), log_missing_full, log_unchanged_templates);

                let mut cflowd_acc = OutputAccumulator::new();
                let mut ipfix_acc = OutputAccumulator::new();

                loop {
                    let timeout = [cflowd_acc.time_until_flush(), ipfix_acc.time_until_flush()].into_iter().flatten().min();
                    let batch = match timeout {
                        Some(t) => q1.get_timeout(t),
                        None => q1.get(),
                    };
                    let mut stopping = false;

                    for datagram in batch {
                        if datagram.is_sentinel() {
                            stopping = true;
                            continue;
                        }

                        let out = decoder.decode_datagram(datagram.peer_addr, datagram.local_port, datagram.buffer.filled());
                        free_return.put_one(datagram.buffer);

                        if q2_cflowd_for_decode.is_some() && !out.cflowd.is_empty() {
                            cflowd_acc.push(out.cflowd);
                        }
                        if q2_ipfix_for_decode.is_some() && !out.raw_ipfix.is_empty() {
                            ipfix_acc.push(out.raw_ipfix);
                        }
                    }

                    if stopping || cflowd_acc.should_flush() {
                        if let Some(q) = &q2_cflowd_for_decode {
                            q.put(cflowd_acc.drain());
                        }
                    }
                    if stopping || ipfix_acc.should_flush() {
                        if let Some(q) = &q2_ipfix_for_decode {
                            q.put(ipfix_acc.drain());
                        }
                    }

                    if stopping {
                        if let Some(q) = &q2_cflowd_for_decode {
                            q.put_one(Vec::new());
                        }
                        if let Some(q) = &q2_ipfix_for_decode {
                            q.put_one(Vec::new());
                        }
                        info!("decoder for port {} stopped", decode_port);
                        return;
                    }
                }
            })
            .expect("spawn decoder thread"),
    );

    if let Some(q2) = q2_cflowd {
        let writer = Writer::new(spec.temp_dir.clone(), spec.dest_dir.clone(), "cflowd", spec.write_timeout, q2);
        handles.push(thread::Builder::new().name(format!("Writer-cflowd-{}", spec.port)).spawn(move || writer.run()).expect("spawn cflowd writer thread"));
    }
    if let Some(q2) = q2_ipfix {
        let writer = Writer::new(spec.temp_dir, spec.dest_dir, "ipfix", spec.write_timeout, q2);
        handles.push(thread::Builder::new().name(format!("Writer-ipfix-{}", spec.port)).spawn(move || writer.run()).expect("spawn ipfix writer thread"));
    }

    handles
}

fn main() {
    let opts = Opts::from_args();

    env_logger::Builder::new().format_timestamp_millis().filter(None, opts.log_level).init();

    let port_specs = match opts.port_specs() {
        Ok(specs) => specs,
        Err(e) => {
            error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("starting ipfixd with {} configured port(s)", port_specs.len());

    let ctx = DaemonContext::new();
    if let Err(e) = signals::spawn(Arc::clone(&ctx)) {
        error!("failed to install signal handlers: {}", e);
        std::process::exit(1);
    }

    let mut handles = Vec::new();
    for spec in port_specs {
        handles.extend(spawn_port_pipeline(spec, Arc::clone(&ctx), opts.log_missing_full, opts.log_unchanged_templates));
    }

    for handle in handles {
        if handle.join().is_err() {
            ctx.bump_exit_code(1);
        }
    }

    info!("ipfixd stopped");
    std::process::exit(ctx.exit_code());
}
