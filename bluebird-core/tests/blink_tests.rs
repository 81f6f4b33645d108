use bluebird_core::utils::controllers::Blinker;
use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTrans};

mod support;
use support::RecordingDelay;

#[test]
fn one_second_on_one_second_off() {
    let expectations = [
        PinTrans::set(State::High),
        PinTrans::set(State::Low),
        PinTrans::set(State::High),
        PinTrans::set(State::Low),
    ];
    let pin = PinMock::new(&expectations);
    let mut blinker = Blinker::new(pin);
    let mut delay = RecordingDelay::default();

    blinker.cycle(&mut delay).unwrap();
    blinker.cycle(&mut delay).unwrap();

    assert_eq!(blinker.cycles(), 2);
    assert_eq!(delay.waits_ms, vec![1_000, 1_000, 1_000, 1_000]);
    blinker.release().done();
}

#[test]
fn custom_timing() {
    let expectations = [PinTrans::set(State::High), PinTrans::set(State::Low)];
    let pin = PinMock::new(&expectations);
    let mut blinker = Blinker::with_timing(pin, 250, 750);
    let mut delay = RecordingDelay::default();

    blinker.cycle(&mut delay).unwrap();

    assert_eq!(delay.waits_ms, vec![250, 750]);
    blinker.release().done();
}
