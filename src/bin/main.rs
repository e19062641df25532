#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use core::net::Ipv4Addr;

use embassy_executor::Spawner;
use embassy_futures::join::{join, join3, join4};
use embassy_net::{Ipv4Cidr, StaticConfigV4};
use embassy_time::Timer;
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::{
    Blocking,
    analog::adc::{Adc, AdcConfig, Attenuation},
    clock::CpuClock,
    delay::Delay,
    efuse::Efuse,
    gpio::{Input, InputConfig, Level, Output, OutputConfig},
    spi::master::Spi,
    time::Rate,
    timer::timg::TimerGroup,
};
use log::{LevelFilter, info, warn};
use minu_core::{
    Coordinator, Shared, boot,
    fob::{self, FobActions, FobConfig, FobRenderHooks},
    input::{InputConfig as PressConfig, InputMonitor},
    probe::PingTarget,
    render::{RenderConfig, RenderScheduler},
    ui::UiController,
    worker::{WorkerConfig, WorkerRunner},
};
use minu_hal_esp32::{
    input::{ButtonConfig, GpioButtons},
    network::{ConnectivityHandle, WifiCredentials},
    platform::LcdCanvas,
};
use st7789::{Config as LcdConfig, Orientation, St7789};
use static_cell::StaticCell;

use power::{Battery, PowerHold};
use radio::{AP_ADDRESS, RadioChannels, RadioConfig, RadioLink};
use sources::FirmwareSources;

#[path = "main/power.rs"]
mod power;
#[path = "main/radio.rs"]
mod radio;
#[path = "main/sntp.rs"]
mod sntp;
#[path = "main/sources.rs"]
mod sources;

esp_bootloader_esp_idf::esp_app_desc!();

const LCD_SPI_MHZ: u32 = 27;
const CONNECTIVITY_POLL_MS: u64 = 250;
const FOB_NAME: &str = match option_env!("MINU_FOB_NAME") {
    Some(name) => name,
    None => fob::FOB_NAME_DEFAULT,
};
const WIFI_SSID: &str = match option_env!("MINU_WIFI_SSID") {
    Some(ssid) => ssid,
    None => fob::STA_SSID_DEFAULT,
};
const WIFI_PASSWORD: &str = match option_env!("MINU_WIFI_PASSWORD") {
    Some(password) => password,
    None => "password",
};
const AP_SSID: &str = match option_env!("MINU_AP_SSID") {
    Some(ssid) => ssid,
    None => fob::AP_SSID_DEFAULT,
};
const AP_PASSWORD: &str = match option_env!("MINU_AP_PASSWORD") {
    Some(password) => password,
    None => "Hello#mINU!",
};

const RADIO_CONFIG: RadioConfig = RadioConfig {
    station: WifiCredentials::new(WIFI_SSID, WIFI_PASSWORD),
    access_point: WifiCredentials::new(AP_SSID, AP_PASSWORD),
};

type LcdSpi = ExclusiveDevice<Spi<'static, Blocking>, Output<'static>, Delay>;
type Lcd = St7789<LcdSpi, Output<'static>, Output<'static>>;

static CONNECTIVITY: ConnectivityHandle = ConnectivityHandle::new();
static RADIO: RadioChannels = RadioChannels::new();
static STA_RESOURCES: StaticCell<embassy_net::StackResources<4>> = StaticCell::new();
static AP_RESOURCES: StaticCell<embassy_net::StackResources<2>> = StaticCell::new();

fn ping_targets() -> [PingTarget; 3] {
    [
        PingTarget::by_ip("Gateway", Ipv4Addr::new(192, 168, 1, 1)),
        PingTarget::by_host("Google", "google.com"),
        PingTarget::by_ip("Cloudflare", Ipv4Addr::new(1, 1, 1, 1)),
    ]
}

/// Redraws when the radio state moves so the Wi-Fi indicator stays current.
async fn connectivity_watch(coord: &Coordinator) -> ! {
    let mut last_revision = CONNECTIVITY.revision();
    loop {
        Timer::after_millis(CONNECTIVITY_POLL_MS).await;
        let revision = CONNECTIVITY.revision();
        if revision != last_revision {
            last_revision = revision;
            coord.render.request();
        }
    }
}

async fn fault(what: &str) -> ! {
    loop {
        warn!("boot: {} unavailable, halted", what);
        Timer::after_secs(1).await;
    }
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    esp_println::logger::init_logger(LevelFilter::Info);
    esp_println::println!("boot: minu fob starting");

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Latch the power rail before anything slow happens.
    let _power = PowerHold::engage(Output::new(
        peripherals.GPIO4,
        Level::High,
        OutputConfig::default(),
    ));

    // esp-radio requires an allocator.
    esp_alloc::heap_allocator!(size: 72 * 1024);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // LCD wiring: SCK=GPIO13 MOSI=GPIO15 CS=GPIO5 DC=GPIO14 RST=GPIO12 BL=GPIO27
    let _backlight = Output::new(peripherals.GPIO27, Level::High, OutputConfig::default());
    let lcd_cs = Output::new(peripherals.GPIO5, Level::High, OutputConfig::default());
    let lcd_dc = Output::new(peripherals.GPIO14, Level::Low, OutputConfig::default());
    let lcd_rst = Output::new(peripherals.GPIO12, Level::High, OutputConfig::default());

    let spi_config = esp_hal::spi::master::Config::default()
        .with_frequency(Rate::from_mhz(LCD_SPI_MHZ))
        .with_mode(esp_hal::spi::Mode::_0);
    let spi = match Spi::new(peripherals.SPI2, spi_config) {
        Ok(spi) => spi
            .with_sck(peripherals.GPIO13)
            .with_mosi(peripherals.GPIO15),
        Err(err) => {
            info!("display spi config failed: {:?}", err);
            fault("display").await
        }
    };
    let spi_device = match ExclusiveDevice::new(spi, lcd_cs, Delay::new()) {
        Ok(device) => device,
        Err(_) => fault("display").await,
    };

    let mut delay = Delay::new();
    let mut lcd: Lcd = St7789::new(
        spi_device,
        lcd_dc,
        lcd_rst,
        LcdConfig::default().with_orientation(Orientation::Landscape),
    );
    if let Err(err) = lcd.init(&mut delay) {
        esp_println::println!("display: init failed");
        info!("display init failed: {:?}", err);
    } else {
        esp_println::println!("display: init ok");
    }
    let canvas = LcdCanvas::new(lcd);

    // Buttons: A=GPIO37 B=GPIO39 C=GPIO35, external pull-ups, active low.
    let buttons = match GpioButtons::new(
        Input::new(peripherals.GPIO37, InputConfig::default()),
        Input::new(peripherals.GPIO39, InputConfig::default()),
        Input::new(peripherals.GPIO35, InputConfig::default()),
        ButtonConfig::default(),
    ) {
        Ok(buttons) => buttons,
        Err(err) => {
            info!("button init failed: {:?}", err);
            fault("buttons").await
        }
    };

    let mut adc_config = AdcConfig::new();
    let battery_pin = adc_config.enable_pin(peripherals.GPIO38, Attenuation::_11dB);
    let battery = Battery::new(Adc::new(peripherals.ADC1, adc_config), battery_pin);

    let targets = ping_targets();
    let (menu, pages) = match fob::build_menu(&targets) {
        Ok(built) => built,
        Err(err) => boot::halt(err).await,
    };
    let shared = Shared::new(menu, canvas);
    for target in targets {
        if !shared.targets.push(target) {
            warn!("ping: target list full");
        }
    }

    let radio = match esp_radio::init() {
        Ok(radio) => radio,
        Err(err) => {
            info!("esp-radio init failed: {:?}", err);
            fault("radio").await
        }
    };
    let (mut wifi_controller, interfaces) =
        match esp_radio::wifi::new(&radio, peripherals.WIFI, esp_radio::wifi::Config::default()) {
            Ok(parts) => parts,
            Err(err) => {
                info!("wifi peripheral init failed: {:?}", err);
                fault("wifi").await
            }
        };

    let (sta_stack, mut sta_runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        STA_RESOURCES.init(embassy_net::StackResources::<4>::new()),
        0x3D1E_7A90_5C42_B817,
    );
    let ap_config = embassy_net::Config::ipv4_static(StaticConfigV4 {
        address: Ipv4Cidr::new(AP_ADDRESS, 24),
        gateway: Some(AP_ADDRESS),
        dns_servers: Default::default(),
    });
    let (_ap_stack, mut ap_runner) = embassy_net::new(
        interfaces.ap,
        ap_config,
        AP_RESOURCES.init(embassy_net::StackResources::<2>::new()),
        0x6B20_44E1_9F03_D25A,
    );

    let fob_config = FobConfig::default()
        .with_name(FOB_NAME)
        .with_sta_ssid(WIFI_SSID)
        .with_ap_ssid(AP_SSID);

    let mut monitor = InputMonitor::new(buttons, PressConfig::default());
    let mut controller =
        UiController::new(FobActions::new(RadioLink::new(&CONNECTIVITY, &RADIO), pages));
    let mut scheduler = RenderScheduler::new(
        FobRenderHooks::new(&CONNECTIVITY, pages, fob_config),
        RenderConfig::default(),
    );
    let mut runner = WorkerRunner::new(
        FirmwareSources::new(
            sta_stack,
            &CONNECTIVITY,
            battery,
            FOB_NAME,
            Efuse::mac_address(),
        ),
        WorkerConfig::default(),
    );

    info!("Display pins: SCK=GPIO13 MOSI=GPIO15 CS=GPIO5 DC=GPIO14 RST=GPIO12 BL=GPIO27");
    info!("Button pins: A=GPIO37 B=GPIO39 C=GPIO35");
    info!("fob {} ready, {} ping targets", FOB_NAME, shared.targets.len());

    let net_future = join(sta_runner.run(), ap_runner.run());
    let wifi_future = radio::wifi_loop(
        &mut wifi_controller,
        sta_stack,
        &CONNECTIVITY,
        &RADIO,
        RADIO_CONFIG,
    );
    let ui_future = join3(
        monitor.run(&shared.coord),
        controller.run(&shared),
        connectivity_watch(&shared.coord),
    );
    let draw_future = join(scheduler.run(&shared), runner.run(&shared));

    let _ = join4(net_future, wifi_future, ui_future, draw_future).await;
    unreachable!()
}
