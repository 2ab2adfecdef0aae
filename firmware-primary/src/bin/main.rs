#![no_std]
#![no_main]

use defmt::{debug, info, trace, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c::{self, Async, I2c};
use embassy_rp::peripherals::{I2C0, USB};
use embassy_rp::usb::Driver;
use embassy_time::{Instant, Timer};
use embassy_usb::class::hid::State;
use embassy_usb::{Builder, Config as UsbConfig};
use link_core::{LinkBridge, LinkConfig, PublishOutcome, UsbLinkState};
use link_primary::{configure_usb_hid, I2cLinkBus, UsbHidOutput, UsbStateHandler, USB_PID, USB_VID};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    I2C0_IRQ => i2c::InterruptHandler<I2C0>;
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

const CONFIG: LinkConfig = LinkConfig::DEFAULT;

type Bridge = LinkBridge<I2cLinkBus<I2c<'static, I2C0, Async>>, UsbHidOutput<'static>>;

/// Written by the USB state handler, read by the report sink.
static USB_STATE: UsbLinkState = UsbLinkState::new();

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// HID state.
static HID_STATE: StaticCell<State> = StaticCell::new();
static USB_HANDLER: StaticCell<UsbStateHandler> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("link primary starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- I2C Setup ---
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = CONFIG.bus_frequency_hz;

    let i2c = I2c::new_async(
        p.I2C0,
        p.PIN_5, // SCL
        p.PIN_4, // SDA
        Irqs,
        i2c_config,
    );
    let bus = I2cLinkBus::new(i2c, CONFIG.address, CONFIG.bus_timeout_ms);

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(USB_VID, USB_PID);
    usb_config.manufacturer = Some("Nintendo Co., Ltd");
    usb_config.product = Some("Pro Controller");
    usb_config.serial_number = Some("000000000001");
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

    builder.handler(USB_HANDLER.init(UsbStateHandler::new(&USB_STATE)));

    // Configure HID class
    let hid_state = HID_STATE.init(State::new());
    let hid_writer = configure_usb_hid(&mut builder, hid_state, CONFIG.hid_poll_ms());

    // Build the USB device
    let usb_device = builder.build();

    // A report write may block for at most one publish period
    let usb_output = UsbHidOutput::new(hid_writer, &USB_STATE, CONFIG.publish_period_ms);

    let bridge = LinkBridge::new(bus, usb_output, &CONFIG);

    // Heartbeat LED (on-board LED on Pico)
    let led = Output::new(p.PIN_25, Level::Low);

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(defmt::unwrap!(usb_task(usb_device)));
    spawner.spawn(defmt::unwrap!(link_task(bridge, led)));

    info!(
        "link primary initialized, polling 0x{:02x} every {} ms",
        CONFIG.address, CONFIG.poll_period_ms
    );
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) {
    device.run().await;
}

/// Link task - the cooperative poll/publish/heartbeat loop.
#[embassy_executor::task]
async fn link_task(mut bridge: Bridge, mut led: Output<'static>) {
    let mut healthy = false;

    loop {
        let now_ms = Instant::now().as_millis() as u32;
        let step = bridge.step(now_ms).await;

        match step.poll {
            Some(Ok(snapshot)) => {
                if !healthy {
                    info!("link up: {:?}", snapshot);
                    healthy = true;
                }
                trace!("poll ok: {:?}", snapshot);
            }
            Some(Err(e)) => {
                if healthy {
                    warn!("link degraded: {:?}", e);
                    healthy = false;
                }
                debug!("poll failed: {:?} ({:?})", e, bridge.poll_stats());
            }
            None => {}
        }

        if let PublishOutcome::Failed(e) = step.publish {
            debug!("report not sent: {:?}", e);
        }

        if let Some(on) = step.led {
            led.set_level(Level::from(on));
        }

        Timer::after_millis(1).await;
    }
}
