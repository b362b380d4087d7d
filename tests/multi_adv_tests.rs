//! Tests for the advertisement rotator
//!
//! These tests run on the target hardware using defmt-test

#![no_std]
#![no_main]
#![feature(alloc_error_handler)]

mod common;

use nrf52840_ble_apps::ble::adv_data::{self, AdvDataError, AdvPayload};
use nrf52840_ble_apps::ble::multi_adv::{AdvSource, MultiAdv, RotatorError, DEFAULT_SWITCH_INTERVAL_MS};
use nrf52840_ble_apps::core::error::AppError;
use proptest::prelude::*;

fn source_a() -> Result<AdvPayload, AdvDataError> {
    adv_data::only_name("a")
}

fn source_b() -> Result<AdvPayload, AdvDataError> {
    adv_data::only_name("b")
}

fn source_c() -> Result<AdvPayload, AdvDataError> {
    adv_data::only_name("c")
}

fn broken_source() -> Result<AdvPayload, AdvDataError> {
    Err(AdvDataError::Overflow)
}

const SOURCES: [AdvSource; 3] = [source_a, source_b, source_c];

/// Single character name of a payload built by one of the sources above
fn name_of(result: Result<AdvPayload, RotatorError>) -> Option<u8> {
    result.ok().and_then(|payload| payload.adv.get(5).copied())
}

#[defmt_test::tests]
mod tests {
    use defmt::{assert, assert_eq};

    use super::*;
    use crate::common::*;

    #[init]
    fn init() {
        ensure_heap_initialized();
    }

    #[test]
    fn test_new_rotator_is_idle() {
        let rotator: MultiAdv<3> = MultiAdv::new();
        assert!(rotator.is_empty());
        assert!(!rotator.is_running());
        assert_eq!(rotator.index(), 0);
        assert_eq!(rotator.switch_interval().as_millis(), DEFAULT_SWITCH_INTERVAL_MS as u64);
    }

    #[test]
    fn test_register_until_full() {
        let mut rotator: MultiAdv<3> = MultiAdv::new();
        for source in SOURCES {
            assert_eq!(rotator.register(source), Ok(()));
        }
        assert_eq!(rotator.register(source_a), Err(RotatorError::Full));
        assert_eq!(rotator.len(), 3);
    }

    #[test]
    fn test_empty_rotator() {
        let mut rotator: MultiAdv<3> = MultiAdv::new();
        assert_eq!(rotator.current().err(), Some(RotatorError::Empty));
        assert_eq!(rotator.advance().err(), Some(RotatorError::Empty));
        assert_eq!(rotator.index(), 0);
    }

    #[test]
    fn test_advance_wraps_around() {
        let mut rotator: MultiAdv<3> = MultiAdv::new();
        for source in SOURCES {
            rotator.register(source).unwrap();
        }

        assert_eq!(name_of(rotator.current()), Some(b'a'));
        assert_eq!(name_of(rotator.advance()), Some(b'b'));
        assert_eq!(name_of(rotator.advance()), Some(b'c'));
        assert_eq!(name_of(rotator.advance()), Some(b'a'));
        assert_eq!(rotator.index(), 0);
    }

    #[test]
    fn test_current_does_not_advance() {
        let mut rotator: MultiAdv<3> = MultiAdv::new();
        rotator.register(source_a).unwrap();
        rotator.register(source_b).unwrap();

        assert_eq!(name_of(rotator.current()), Some(b'a'));
        assert_eq!(name_of(rotator.current()), Some(b'a'));
        assert_eq!(rotator.index(), 0);
    }

    #[test]
    fn test_single_source_repeats() {
        let mut rotator: MultiAdv<3> = MultiAdv::new();
        rotator.register(source_c).unwrap();

        assert_eq!(name_of(rotator.advance()), Some(b'c'));
        assert_eq!(name_of(rotator.advance()), Some(b'c'));
    }

    #[test]
    fn test_source_error_is_reported() {
        let mut rotator: MultiAdv<3> = MultiAdv::new();
        rotator.register(source_a).unwrap();
        rotator.register(broken_source).unwrap();

        assert_eq!(
            rotator.advance().err(),
            Some(RotatorError::Payload(AdvDataError::Overflow))
        );
        // Rotation continues past the broken slot
        assert_eq!(name_of(rotator.advance()), Some(b'a'));
    }

    #[test]
    fn test_errors_reach_app_error() {
        let mut rotator: MultiAdv<2> = MultiAdv::new();
        assert_eq!(
            rotator.advance().map_err(AppError::from).err(),
            Some(AppError::Rotator(RotatorError::Empty))
        );

        let from_payload = broken_source().map_err(AppError::from).err();
        assert_eq!(from_payload, Some(AppError::AdvData(AdvDataError::Overflow)));
    }

    #[test]
    fn test_start_stop_and_interval() {
        let mut rotator: MultiAdv<3> = MultiAdv::new();
        rotator.init(250);
        assert_eq!(rotator.switch_interval().as_millis(), 250);

        rotator.start();
        assert!(rotator.is_running());
        rotator.stop();
        assert!(!rotator.is_running());
    }

    #[test]
    fn test_index_follows_advance_count() {
        proptest!(|(registered in 1usize..=3, steps in 0usize..64)| {
            let mut rotator: MultiAdv<3> = MultiAdv::new();
            for source in SOURCES.iter().take(registered) {
                rotator.register(*source).unwrap();
            }

            for _ in 0..steps {
                prop_assert!(rotator.advance().is_ok());
                prop_assert!(rotator.index() < rotator.len());
            }
            prop_assert_eq!(rotator.index(), steps % registered);
        });
    }
}
