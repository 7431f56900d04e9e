//! Driving heterogeneous devices through the capability traits.

use std::sync::Arc;

use sc_linac::channel::mock::MockProvider;
use sc_linac::channel::{ChannelRegistry, ChannelValue, RetryPolicy};
use sc_linac::config::TimingSettings;
use sc_linac::constants::{MAGNET_ON_VALUE, SSA_STATUS_ON_VALUE};
use sc_linac::devices::capabilities::{Calibrate, PowerControl};
use sc_linac::devices::{Cavity, CavityId, Magnet, Ssa};

const CAVITY_PREFIX: &str = "ACCL:L3B:1610:";

fn registry() -> (Arc<MockProvider>, ChannelRegistry) {
    let provider = Arc::new(MockProvider::new());
    let registry = ChannelRegistry::new(provider.clone(), RetryPolicy::immediate(2));
    (provider, registry)
}

fn cavity(registry: &ChannelRegistry) -> Cavity {
    let id = CavityId {
        linac: "L3B".to_owned(),
        cryomodule: "16".to_owned(),
        is_harmonic_linearizer: false,
        rack: 'A',
        number: 1,
    };
    Cavity::new(registry, id, TimingSettings::immediate())
}

#[tokio::test]
async fn power_control_turns_on_every_device_kind() {
    let (provider, registry) = registry();
    let ssa = Ssa::new(&registry, CAVITY_PREFIX, TimingSettings::immediate());
    let cavity = cavity(&registry);
    let magnet = Magnet::new(&registry, "QUAD", "L3B", "16");

    provider.script_reads(
        &format!("{CAVITY_PREFIX}SSA:StatusMsg"),
        [ChannelValue::Int(2), ChannelValue::Int(SSA_STATUS_ON_VALUE)],
    );
    provider.script_reads(
        &format!("{CAVITY_PREFIX}RFSTATE"),
        [ChannelValue::Int(0), ChannelValue::Int(1)],
    );

    let devices: Vec<&dyn PowerControl> = vec![&ssa, &cavity, &magnet];
    for device in devices {
        device.turn_on().await.unwrap();
    }

    assert_eq!(
        provider.puts_for(&format!("{CAVITY_PREFIX}SSA:PowerOn")),
        vec![ChannelValue::Int(1)]
    );
    assert_eq!(
        provider.puts_for(&format!("{CAVITY_PREFIX}RFCTRL")),
        vec![ChannelValue::Int(1)]
    );
    assert_eq!(
        provider.puts_for("QUAD:L3B:1685:CTRL"),
        vec![ChannelValue::Int(MAGNET_ON_VALUE)]
    );
}

#[tokio::test]
async fn calibrate_object_runs_the_ssa_sweep() {
    let (provider, registry) = registry();
    let ssa = Ssa::new(&registry, CAVITY_PREFIX, TimingSettings::immediate());

    provider.set(&format!("{CAVITY_PREFIX}SSA:StatusMsg"), SSA_STATUS_ON_VALUE);
    provider.set(&format!("{CAVITY_PREFIX}SSA:CALSTS"), 1i64);
    provider.set(&format!("{CAVITY_PREFIX}SSA:SLOPE_NEW"), 1.1);

    let device: &dyn Calibrate = &ssa;
    device.run_calibration().await.unwrap();

    assert_eq!(
        provider.puts_for(&format!("{CAVITY_PREFIX}PUSH_SSA_SLOPE.PROC")),
        vec![ChannelValue::Int(1)]
    );
}
