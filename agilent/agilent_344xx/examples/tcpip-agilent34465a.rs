//! This example demonstrates how to connect to an Agilent/Keysight 34465A via its LAN interface.
//!
//! The instrument listens for SCPI commands on port 5025. Set `RUST_LOG=trace` to see every command
//! that is sent and every response that is received.

use std::time::Duration;

use instrumentrs::TcpIpInterface;

use agilent_344xx::{Agilent34465a, AutoZero, Dmm, MeasurementFunction};

fn main() {
    env_logger::init();

    // Define the TCP/IP instrument interface on the default SCPI port.
    let interface = TcpIpInterface::scpi("192.168.1.10").unwrap();

    // Now we can open the 34465A with the TCP/IP interface.
    let mut inst = Agilent34465a::try_new(interface).unwrap();

    // Query and print the name of the instrument
    println!("Instrument name: {}", inst.get_name().unwrap());

    // Measure DC voltage with a fixed aperture and a single auto-zero
    inst.set_function(MeasurementFunction::DcVolts).unwrap();
    inst.set_auto_range(true).unwrap();
    inst.set_auto_zero(AutoZero::Once).unwrap();
    inst.set_aperture_time(Duration::from_millis(100)).unwrap();
    println!("DC voltage: {}", inst.read().unwrap());

    // Frequency has no auto-zero, the last value is only cached
    inst.set_function(MeasurementFunction::Frequency).unwrap();
    println!("Auto-zero (cached): {}", inst.get_auto_zero().unwrap());
    println!("Frequency: {}", inst.read().unwrap());

    // Take ten samples, 10 ms apart, and fetch them from memory
    inst.set_sample_count(10).unwrap();
    inst.set_sample_interval(Duration::from_millis(10)).unwrap();
    inst.initiate().unwrap();
    for reading in inst.fetch().unwrap() {
        println!("Sample: {reading}");
    }

    // Print all properties
    for name in inst.names() {
        println!("{name}: {}", inst.get(name).unwrap());
    }

    let (code, msg) = inst.error_query().unwrap();
    println!("Error queue: {code}, {msg}");
}
