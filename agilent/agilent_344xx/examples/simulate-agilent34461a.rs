//! This example runs the 34461A driver in simulation mode, so no instrument is needed.
//!
//! All settings are kept in the property cache of the driver. Run with `RUST_LOG=debug` to see
//! the cache at work.

use std::time::Duration;

use instrumentrs::{LoopbackInterfaceString, SessionConfig};

use agilent_344xx::{Agilent34461a, Dmm, MeasurementFunction, TriggerSource};

fn main() {
    env_logger::init();

    // An empty loopback interface panics on any I/O, which simulation never does.
    let interface = LoopbackInterfaceString::new(vec![], vec![], "\n");
    let mut inst = Agilent34461a::with_config(interface, SessionConfig::simulated()).unwrap();

    println!("Instrument name: {}", inst.get_name().unwrap());

    inst.set_function(MeasurementFunction::TwoWireResistance)
        .unwrap();
    inst.set_range(1e3).unwrap();
    inst.set_trigger_source(TriggerSource::Bus).unwrap();
    inst.set_trigger_delay(Duration::from_millis(20)).unwrap();

    for name in inst.names() {
        println!("{name}: {}", inst.get(name).unwrap());
    }

    println!("Reading: {}", inst.read().unwrap());
}
