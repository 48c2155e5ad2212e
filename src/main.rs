use system_monitor_linux::{Config, Metric, Monitor, SampleResult};
use std::thread;
use std::time::Duration;

fn main() {
    env_logger::init();

    let config = Config::load();
    let emit_json = config.emit_json;
    let monitor = Monitor::new(&config);

    let started = monitor.on_sample(move |sample: SampleResult| {
        for metric in &sample.alerts_fired {
            log::warn!("Alert: {} at {:.1}%", metric, sample.value(*metric));
        }
        if emit_json {
            match serde_json::to_string(&sample) {
                Ok(line) => println!("{}", line),
                Err(e) => log::error!("Failed to serialize sample: {}", e),
            }
        } else {
            log::info!(
                "cpu {:.1}% mem {:.1}% disk {:.1}% up {:.1} KB/s down {:.1} KB/s",
                sample.cpu_percent,
                sample.memory_percent,
                sample.disk_percent,
                sample.value(Metric::NetSent),
                sample.value(Metric::NetRecv),
            );
        }
    });

    if let Err(e) = started {
        log::error!("Failed to start sampler thread: {}", e);
        std::process::exit(1);
    }

    let apps = monitor.query_applications(None);
    log::info!("{} applications running", apps.len());
    for app in apps.iter().take(10) {
        log::info!("  {:>7} {:<24} {:>8.1} MB", app.pid, app.name, app.memory_mb());
    }

    loop {
        thread::sleep(Duration::from_secs(3600));
    }
}
