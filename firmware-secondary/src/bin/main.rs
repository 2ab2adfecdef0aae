#![no_std]
#![no_main]

use core::cell::{Cell, RefCell};

use defmt::{debug, info, trace, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::interrupt;
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Ticker};
use embassy_usb::class::cdc_acm::State;
use embassy_usb::{Builder, Config as UsbConfig};
use link_core::{
    BusResponder, ControlError, ControlLink, DiagnosticsReport, LinkConfig, SnapshotStore, STARTUP_BANNER,
};
use link_proto::{FrameStats, Snapshot};
use link_secondary::{configure_usb_serial, i2c_target, CdcControlChannel, DiagnosticsWriter};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

const CONFIG: LinkConfig = LinkConfig::DEFAULT;

/// The snapshot served to the primary. Written by the control task, read by `I2C0_IRQ`.
static STORE: SnapshotStore = SnapshotStore::new(Snapshot::NEUTRAL);

/// Responder state, owned by `I2C0_IRQ`; the diagnostics task only reads counters.
static RESPONDER: Mutex<CriticalSectionRawMutex, RefCell<BusResponder>> =
    Mutex::new(RefCell::new(BusResponder::new()));

/// Latest frame parser counters, published by the control task.
static FRAME_STATS: Mutex<CriticalSectionRawMutex, Cell<FrameStats>> = Mutex::new(Cell::new(FrameStats {
    accepted: 0,
    malformed: 0,
    overwritten: 0,
}));

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// CDC-ACM state.
static CDC_STATE: StaticCell<State> = StaticCell::new();

#[interrupt]
fn I2C0_IRQ() {
    RESPONDER.lock(|responder| i2c_target::service(&mut responder.borrow_mut(), &STORE));
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("link secondary starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- I2C target Setup ---
    i2c_target::init(p.I2C0, p.PIN_4, p.PIN_5, CONFIG.address);

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(0x2e8a, 0x000a); // Raspberry Pi Pico CDC
    usb_config.manufacturer = Some("Raspberry Pi");
    usb_config.product = Some("Controller Link Secondary");
    usb_config.serial_number = Some("000000000002");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );

    // Configure CDC-ACM class
    let cdc_state = CDC_STATE.init(State::new());
    let (channel, writer) = configure_usb_serial(&mut builder, cdc_state);

    // Build the USB device
    let usb_device = builder.build();

    let led = Output::new(p.PIN_25, Level::Low);

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(defmt::unwrap!(usb_task(usb_device)));
    spawner.spawn(defmt::unwrap!(control_task(channel)));
    spawner.spawn(defmt::unwrap!(diagnostics_task(writer)));
    spawner.spawn(defmt::unwrap!(heartbeat_task(led)));

    info!("link secondary initialized at 0x{:02x}, waiting for host...", CONFIG.address);
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) {
    device.run().await;
}

/// Control task - moves frames from the serial port into the snapshot store.
#[embassy_executor::task]
async fn control_task(channel: CdcControlChannel<'static>) {
    let mut link = ControlLink::new(channel, &STORE);

    loop {
        link.channel_mut().wait_connection().await;
        link.reset();
        info!("control channel open");

        loop {
            match link.pump().await {
                Ok(stored) => {
                    if stored > 0 {
                        trace!("stored {} frame(s): {:?}", stored, STORE.load());
                    }
                    let stats = link.parser_stats();
                    FRAME_STATS.lock(|cell| cell.set(stats));
                }
                Err(ControlError::Disconnected) => {
                    info!("control channel closed");
                    break;
                }
                Err(e) => warn!("control read failed: {:?}", e),
            }
        }
    }
}

/// Diagnostics task - announces the unit, then reports counters over the
/// serial port and RTT.
#[embassy_executor::task]
async fn diagnostics_task(mut writer: DiagnosticsWriter<'static>) {
    writer.wait_connection().await;
    match writer.write_text(STARTUP_BANNER).await {
        Ok(()) => info!("banner sent"),
        Err(e) => debug!("banner not written: {:?}", e),
    }

    let mut ticker = Ticker::every(Duration::from_millis(u64::from(CONFIG.diagnostics_period_ms)));

    loop {
        ticker.next().await;

        let report = DiagnosticsReport {
            responder: RESPONDER.lock(|responder| responder.borrow().stats()),
            frames: FRAME_STATS.lock(|cell| cell.get()),
            snapshot: STORE.load(),
            address: CONFIG.address,
        };
        info!(
            "rq={} rxf={} stop={} frames ok={} bad={} lost={}",
            report.responder.read_requests,
            report.responder.rx_events,
            report.responder.stops,
            report.frames.accepted,
            report.frames.malformed,
            report.frames.overwritten
        );

        if writer.is_open() {
            if let Err(e) = writer.write_report(&report).await {
                debug!("diagnostics not written: {:?}", e);
            }
        }
    }
}

/// Heartbeat task - blinks the LED at a fixed rate.
#[embassy_executor::task]
async fn heartbeat_task(mut led: Output<'static>) {
    let mut ticker = Ticker::every(Duration::from_millis(u64::from(CONFIG.secondary_blink_ms)));

    loop {
        ticker.next().await;
        led.toggle();
    }
}
