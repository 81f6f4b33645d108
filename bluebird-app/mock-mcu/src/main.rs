mod hw;

use core::cell::RefCell;
use std::path::PathBuf;

use anyhow::Context;
use bluebird_core::{
    mk_static,
    utils::{
        config::{GatewayConfig, ServoConfig, WeatherConfig},
        connection::http::EmbassyHttp,
        controllers::{Blinker, BluebirdController, UART_CHANNEL},
        schedule::PollTimer,
        sources::{serial::format_co2_line, RandomLevels, ValueSource},
        Delay, Duration, Gateway, Instant, Timer, WeatherClient,
    },
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use embassy_executor::{Executor, Spawner};
use embassy_net::{Config, Ipv4Address, Ipv4Cidr, Runner, StackResources, StaticConfigV4};
use embassy_net_tuntap::TunTapDevice;
use embedded_hal::delay::DelayNs;
use heapless::Vec;
use hw::{LoggingLed, LoggingPwmBus, SystemClock};
use rand_core::{OsRng, RngCore, TryRngCore};
use static_cell::StaticCell;
use tracing::{error, info, warn};

/// Random levels are drawn this often.
const LEVEL_INTERVAL: Duration = Duration::from_secs(10);
/// The gateway polls the API this often.
const POLL_INTERVAL: Duration = Duration::from_secs(5);
/// How long the gateway waits for the network before giving up.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);
/// Per-request socket timeout.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts {
    /// JSON file overriding the servo settings
    #[clap(long)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    sketch: Sketch,
}

#[derive(Subcommand)]
enum Sketch {
    /// Blink the on-board LED once a second
    Blink,
    /// One servo, random levels, fixed two second turns
    Sweep,
    /// Six servos, random levels, turns scaled by the change
    Co2,
    /// Poll an API and forward each reading to the servos
    Gateway(GatewayOpts),
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceKind {
    Building,
    Weather,
}

#[derive(Args)]
struct GatewayOpts {
    /// TAP device name
    #[clap(long, default_value = "tap0")]
    tap: String,
    /// use a static IP instead of DHCP
    #[clap(long)]
    static_ip: bool,
    #[clap(long, value_enum, default_value = "building")]
    source: SourceKind,
    /// Login endpoint of the building API
    #[clap(long, env = "API_URL", default_value = "")]
    api_url: String,
    /// Room data endpoint prefix, the room id is appended
    #[clap(long, env = "API_ENDPOINT", default_value = "")]
    api_endpoint: String,
    #[clap(long, env = "ROOM_ID", default_value = "")]
    room_id: String,
    #[clap(long, env = "API_USERNAME", default_value = "")]
    username: String,
    #[clap(long, env = "API_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,
    /// JSON pointer to the reading in the room data response
    #[clap(long)]
    reading_pointer: Option<String>,
    #[clap(long, env = "WEATHER_URL")]
    weather_url: Option<String>,
    /// JSON pointer to the reading in the weather response
    #[clap(long)]
    weather_pointer: Option<String>,
}

impl GatewayOpts {
    fn gateway_config(&self) -> GatewayConfig {
        let mut cfg = GatewayConfig {
            login_url: self.api_url.clone(),
            data_endpoint: self.api_endpoint.clone(),
            room_id: self.room_id.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            ..GatewayConfig::default()
        };
        if let Some(pointer) = &self.reading_pointer {
            cfg.reading_pointer = pointer.clone();
        }
        cfg
    }

    fn weather_config(&self) -> WeatherConfig {
        let mut cfg = WeatherConfig::default();
        if let Some(url) = &self.weather_url {
            cfg.url = url.clone();
        }
        if let Some(pointer) = &self.weather_pointer {
            cfg.pointer = pointer.clone();
        }
        cfg
    }
}

fn load_servo_config(
    path: Option<&PathBuf>,
    fallback: ServoConfig,
) -> anyhow::Result<ServoConfig> {
    let Some(path) = path else {
        return Ok(fallback);
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn run_blink() -> ! {
    let mut blinker = Blinker::new(LoggingLed);
    let mut delay = Delay;
    loop {
        // LoggingLed cannot fail.
        let _ = blinker.cycle(&mut delay);
    }
}

/// Draw a random level every interval and move the servos by the change.
fn run_random_levels(config: ServoConfig) -> ! {
    let bus = mk_static!(RefCell<LoggingPwmBus>, RefCell::new(LoggingPwmBus));
    let mut ctrl = BluebirdController::new(bus, config);
    let mut levels = RandomLevels::new(OsRng.unwrap_err());
    let mut timer = PollTimer::new(LEVEL_INTERVAL);
    let mut delay = Delay;

    loop {
        let now = Instant::now();
        if timer.is_due(now) {
            let sample = embassy_futures::block_on(levels.sample());
            ctrl.handle_reading(sample, &mut delay);
        } else {
            let wait = timer.remaining(now).as_millis().min(u32::MAX as u64) as u32;
            delay.delay_ms(wait);
        }
    }
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, TunTapDevice>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn controller_task(mut ctrl: BluebirdController<'static, LoggingPwmBus>) -> ! {
    ctrl.uart_ch(&mut Delay).await
}

/// Sample forever, forwarding good readings over the serial link.
async fn poll_loop<S: ValueSource>(source: &mut S) -> ! {
    loop {
        match source.sample().await {
            Ok(reading) => {
                let line = format_co2_line(reading);
                info!("Forwarding: {}", line);
                UART_CHANNEL.send(line).await;
            }
            Err(e) => error!("cycle skipped: {}", e),
        }
        Timer::after(POLL_INTERVAL).await;
    }
}

#[embassy_executor::task]
async fn gateway_task(
    spawner: Spawner,
    opts: GatewayOpts,
    servo_config: ServoConfig,
) {
    let bus = mk_static!(RefCell<LoggingPwmBus>, RefCell::new(LoggingPwmBus));
    let ctrl = BluebirdController::new(bus, servo_config);
    spawner
        .spawn(controller_task(ctrl))
        .expect("spawning controller task");

    let device = match TunTapDevice::new(&opts.tap) {
        Ok(device) => device,
        Err(e) => {
            error!("cannot open TAP device {}: {}", opts.tap, e);
            return;
        }
    };
    let config = if opts.static_ip {
        let mut dns_servers = Vec::new();
        let _ = dns_servers.push(Ipv4Address::new(1, 1, 1, 1));
        Config::ipv4_static(StaticConfigV4 {
            address: Ipv4Cidr::new(Ipv4Address::new(192, 168, 69, 2), 24),
            dns_servers,
            gateway: Some(Ipv4Address::new(192, 168, 69, 1)),
        })
    } else {
        Config::dhcpv4(Default::default())
    };
    let seed = OsRng.unwrap_err().next_u64();

    static RESOURCES: StaticCell<StackResources<4>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        device,
        config,
        RESOURCES.init(StackResources::<4>::new()),
        seed,
    );
    spawner.spawn(net_task(runner)).expect("spawning net task");

    info!("Connecting to network on {}...", opts.tap);
    match embassy_time::with_timeout(CONNECT_TIMEOUT, stack.wait_config_up()).await {
        Ok(()) => match stack.config_v4() {
            Some(cfg) => info!("Connected! IP Address: {}", cfg.address),
            None => info!("Connected!"),
        },
        Err(_) => warn!("Failed to connect within {}s", CONNECT_TIMEOUT.as_secs()),
    }

    let transport = EmbassyHttp::new(stack, HTTP_TIMEOUT);
    match opts.source {
        SourceKind::Building => {
            let mut gateway = Gateway::new(transport, SystemClock, opts.gateway_config());
            if let Err(e) = gateway.login().await {
                error!("login failed: {}", e);
            }
            poll_loop(&mut gateway).await
        }
        SourceKind::Weather => {
            let mut weather = WeatherClient::new(transport, opts.weather_config());
            poll_loop(&mut weather).await
        }
    }
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    match opts.sketch {
        Sketch::Blink => run_blink(),
        Sketch::Sweep => {
            let config = load_servo_config(opts.config.as_ref(), ServoConfig::sweep())?;
            run_random_levels(config)
        }
        Sketch::Co2 => {
            let config = load_servo_config(opts.config.as_ref(), ServoConfig::default())?;
            run_random_levels(config)
        }
        Sketch::Gateway(gateway_opts) => {
            let config = load_servo_config(opts.config.as_ref(), ServoConfig::default())?;
            let executor = EXECUTOR.init(Executor::new());
            executor.run(|spawner| {
                spawner
                    .spawn(gateway_task(spawner, gateway_opts, config))
                    .expect("spawning gateway task");
            })
        }
    }
}
