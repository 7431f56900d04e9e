//! Magnet power-supply command surface and the cavity heater.

use std::sync::Arc;

use sc_linac::channel::mock::MockProvider;
use sc_linac::channel::{ChannelRegistry, ChannelValue, RetryPolicy};
use sc_linac::constants::{
    MAGNET_DEGAUSS_VALUE, MAGNET_OFF_VALUE, MAGNET_ON_VALUE, MAGNET_RESET_VALUE,
    MAGNET_TRIM_VALUE,
};
use sc_linac::devices::{Heater, Magnet};

const PREFIX: &str = "QUAD:L1B:0285:";

fn setup() -> (Arc<MockProvider>, Magnet) {
    let provider = Arc::new(MockProvider::new());
    let registry = ChannelRegistry::new(provider.clone(), RetryPolicy::immediate(2));
    let magnet = Magnet::new(&registry, "QUAD", "L1B", "02");
    (provider, magnet)
}

#[tokio::test]
async fn set_bdes_writes_setpoint_then_one_trim() {
    let (provider, magnet) = setup();

    magnet.set_bdes(0.45).await.unwrap();

    assert_eq!(
        provider.puts_for(&format!("{PREFIX}BDES")),
        vec![ChannelValue::Float(0.45)]
    );
    assert_eq!(
        provider.puts_for(&format!("{PREFIX}CTRL")),
        vec![ChannelValue::Int(MAGNET_TRIM_VALUE)]
    );
    // Setpoint before trim, nothing else written.
    assert_eq!(
        provider.all_puts(),
        vec![
            (format!("{PREFIX}BDES"), ChannelValue::Float(0.45)),
            (format!("{PREFIX}CTRL"), ChannelValue::Int(MAGNET_TRIM_VALUE)),
        ]
    );
}

#[tokio::test]
async fn control_commands_write_their_sentinels() {
    let (provider, magnet) = setup();

    magnet.reset().await.unwrap();
    magnet.turn_on().await.unwrap();
    magnet.turn_off().await.unwrap();
    magnet.degauss().await.unwrap();

    assert_eq!(
        provider.puts_for(&format!("{PREFIX}CTRL")),
        vec![
            ChannelValue::Int(MAGNET_RESET_VALUE),
            ChannelValue::Int(MAGNET_ON_VALUE),
            ChannelValue::Int(MAGNET_OFF_VALUE),
            ChannelValue::Int(MAGNET_DEGAUSS_VALUE),
        ]
    );
}

#[tokio::test]
async fn readbacks_come_from_their_own_channels() {
    let (provider, magnet) = setup();
    provider.set(&format!("{PREFIX}BACT"), 0.44);
    provider.set(&format!("{PREFIX}IACT"), 12.2);
    provider.set(&format!("{PREFIX}INTLKSUMY"), 0i64);

    assert_eq!(magnet.bact().await.unwrap(), 0.44);
    assert_eq!(magnet.iact().await.unwrap(), 12.2);
    assert_eq!(magnet.interlock_summary().await.unwrap(), 0);
    assert_eq!(magnet.magnet_type(), "QUAD");
}

#[tokio::test]
async fn heater_setpoint_and_readback() {
    let provider = Arc::new(MockProvider::new());
    let registry = ChannelRegistry::new(provider.clone(), RetryPolicy::immediate(2));
    let heater = Heater::new(&registry, "02", 3);

    provider.set("CHTR:CM02:1355:HV:POWER", 24.0);
    heater.set_power(30.0).await.unwrap();

    assert_eq!(
        provider.puts_for("CHTR:CM02:1355:HV:POWER_SETPT"),
        vec![ChannelValue::Float(30.0)]
    );
    assert_eq!(heater.power().await.unwrap(), 24.0);
}
