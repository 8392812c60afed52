// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! One-day epochs published across two days.

use crate::error::KernelError;
use crate::state::series::EpochSeries;
use crate::types::commitment::Commitment;
use crate::types::time::Timestamp;

const DAY: u64 = 86_400;

#[test]
fn test_daily_epoch_walkthrough() {
    let r0 = Commitment::digest(b"R0");
    let r1 = Commitment::digest(b"R1");
    let r2 = Commitment::digest(b"R2");

    let mut series = EpochSeries::new(DAY).unwrap();

    series.publish(r0, Timestamp(86_400), Timestamp(86_401)).unwrap();
    assert_eq!(series.first_published(), Some(Timestamp(86_400)));

    series.publish(r1, Timestamp(172_800), Timestamp(172_801)).unwrap();
    assert_eq!(series.last_updated(), Timestamp(172_800));

    assert_eq!(series.at(Timestamp(100_000)).unwrap(), r0);
    // Slot 1 covers [172800, 259200).
    assert_eq!(series.at(Timestamp(200_000)).unwrap(), r1);
    assert!(matches!(
        series.at(Timestamp(259_200)),
        Err(KernelError::OutOfRange { slot: 2, published: 2, .. })
    ));

    // Re-publishing the epoch that just closed is a double publish.
    let err = series.publish(r2, Timestamp(172_800), Timestamp(260_000)).unwrap_err();
    assert_eq!(
        err,
        KernelError::NonConsecutiveEpoch { expected: Timestamp(259_200), found: Timestamp(172_800) }
    );

    // The next epoch cannot be finalized before it ends.
    let err = series.publish(r2, Timestamp(259_200), Timestamp(259_200)).unwrap_err();
    assert!(matches!(err, KernelError::NotYetElapsed { .. }));

    series.publish(r2, Timestamp(259_200), Timestamp(259_201)).unwrap();
    assert_eq!(series.latest().unwrap(), r2);
    assert_eq!(series.len(), 3);
}
