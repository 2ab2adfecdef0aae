//! I2C target (peripheral) side of the inter-board link.
//!
//! The RP2040 I2C block is driven directly through its registers from the
//! `I2C0_IRQ` handler. Register access stays in this module; the transaction
//! logic lives in [`BusResponder`].
//!
//! # Pins
//!
//! Uses I2C0:
//! - GPIO 4: SDA
//! - GPIO 5: SCL
//!
//! The internal pull-ups are enabled but weak; 4.7k to 10k external pull-ups
//! to 3.3 V are recommended.

use embassy_rp::interrupt::{self, InterruptExt, Priority};
use embassy_rp::pac;
use embassy_rp::peripherals::{I2C0, PIN_4, PIN_5};
use embassy_rp::Peri;
use link_core::{BusEvents, BusResponder, ResponderFifo, SnapshotStore, TX_FIFO_DEPTH};

const SDA_PIN: usize = 4;
const SCL_PIN: usize = 5;

/// GPIO function select for I2C.
const FUNCSEL_I2C: u8 = 3;

/// TX/RX FIFOs of the I2C block, seen through [`ResponderFifo`].
pub struct RegisterFifo {
    regs: pac::i2c::I2c,
}

impl RegisterFifo {
    fn i2c0() -> Self {
        Self { regs: pac::I2C0 }
    }
}

impl ResponderFifo for RegisterFifo {
    fn tx_free(&self) -> usize {
        TX_FIFO_DEPTH.saturating_sub(usize::from(self.regs.ic_txflr().read().txflr()))
    }

    fn push_tx(&mut self, byte: u8) {
        self.regs.ic_data_cmd().write(|w| w.set_dat(byte));
    }

    fn pop_rx(&mut self) -> Option<u8> {
        if self.regs.ic_rxflr().read().rxflr() > 0 {
            Some(self.regs.ic_data_cmd().read().dat())
        } else {
            None
        }
    }
}

/// Bring I2C0 up in target mode at `address` and enable its interrupt.
///
/// The peripheral and pins are taken by value so nothing else can claim them.
/// The caller must provide the `I2C0_IRQ` handler, which calls [`service`].
pub fn init(_i2c: Peri<'static, I2C0>, _sda: Peri<'static, PIN_4>, _scl: Peri<'static, PIN_5>, address: u8) {
    pac::RESETS.reset().modify(|w| w.set_i2c0(true));
    pac::RESETS.reset().modify(|w| w.set_i2c0(false));
    while !pac::RESETS.reset_done().read().i2c0() {}

    for pin in [SDA_PIN, SCL_PIN] {
        pac::IO_BANK0.gpio(pin).ctrl().write(|w| w.set_funcsel(FUNCSEL_I2C));
        pac::PADS_BANK0.gpio(pin).write(|w| {
            w.set_schmitt(true);
            w.set_slewfast(false);
            w.set_ie(true);
            w.set_od(false);
            w.set_pue(true);
            w.set_pde(false);
        });
    }

    let regs = pac::I2C0;
    regs.ic_enable().write(|w| w.set_enable(false));
    regs.ic_con().write(|w| {
        w.set_master_mode(false);
        w.set_ic_slave_disable(false);
        w.set_tx_empty_ctrl(true);
        w.set_rx_fifo_full_hld_ctrl(true);
    });
    regs.ic_sar().write(|w| w.set_ic_sar(u16::from(address)));
    regs.ic_tx_tl().write(|w| w.set_tx_tl(0));
    regs.ic_rx_tl().write(|w| w.set_rx_tl(0));

    let _ = regs.ic_clr_intr().read();
    set_tx_empty_irq(false);
    regs.ic_enable().write(|w| w.set_enable(true));

    interrupt::I2C0_IRQ.set_priority(Priority::P3);
    // SAFETY: the handler only touches state behind a critical-section mutex.
    unsafe { interrupt::I2C0_IRQ.enable() };
}

/// Handle one `I2C0_IRQ`. Call with the responder lock held.
pub fn service(responder: &mut BusResponder, store: &SnapshotStore) {
    let regs = pac::I2C0;
    let stat = regs.ic_intr_stat().read();
    let events = BusEvents {
        read_requested: stat.r_rd_req(),
        tx_drained: stat.r_tx_empty(),
        byte_received: stat.r_rx_full(),
        stopped: stat.r_stop_det(),
    };

    if events.read_requested {
        let _ = regs.ic_clr_rd_req().read();
    }

    responder.handle(events, store, &mut RegisterFifo::i2c0());

    if events.stopped {
        let _ = regs.ic_clr_stop_det().read();
        // Also releases a TX FIFO held flushed by an abort.
        let _ = regs.ic_clr_intr().read();
    }

    // TX_EMPTY stays asserted while the FIFO is empty; only listen while bytes are owed.
    set_tx_empty_irq(responder.has_pending_tx());
}

fn set_tx_empty_irq(enabled: bool) {
    pac::I2C0.ic_intr_mask().write(|w| {
        w.set_m_rd_req(true);
        w.set_m_rx_full(true);
        w.set_m_stop_det(true);
        w.set_m_tx_empty(enabled);
    });
}
