//! Read-modify-write of channels narrower than a byte.

use fieldbus_blocks::binary::BinaryData;
use fieldbus_blocks::{
    BlockDriver, ChannelFlag, ChannelRecord, DataType, DriverOptions, Mode, Result, TypedValue,
};

use crate::mock::{Layout, TestDriver};

fn bits() -> TestDriver {
    TestDriver::new()
        .channel("flag0", 1, Layout::Bit(4, 0))
        .channel("flag3", 1, Layout::Bit(4, 3))
        .channel("level", 1, Layout::Data(5, BinaryData::UINT8))
        .channel("far", 1, Layout::Bit(20, 1))
}

fn write_one(driver: &mut TestDriver, name: &str, value: bool) -> Result<ChannelRecord> {
    let mut records = vec![ChannelRecord::write(name, TypedValue::Boolean(value))];
    driver.write(&mut records)?;
    Ok(records.remove(0))
}

#[test]
fn test_bit_write_over_cleared_byte() -> Result<()> {
    let mut driver = bits();
    let record = write_one(&mut driver, "flag3", true)?;

    assert_eq!(record.flag(), Some(ChannelFlag::Success));
    assert_eq!(driver.peek(1, 4, 1), vec![0b0000_1000]);

    let device = driver.device.borrow();
    assert_eq!(device.transfers_in(Mode::Read), vec![(1, 4, 5)]);
    assert_eq!(device.transfers_in(Mode::Write), vec![(1, 4, 5)]);
    assert_eq!(
        driver.factories.borrow().as_slice(),
        &[(1, Mode::Read), (1, Mode::Write)]
    );
    Ok(())
}

#[test]
fn test_bit_write_keeps_other_bits() -> Result<()> {
    let mut driver = bits();
    driver.fill(1, 4, &[0b1111_0111]);
    write_one(&mut driver, "flag3", true)?;
    assert_eq!(driver.peek(1, 4, 1), vec![0b1111_1111]);

    write_one(&mut driver, "flag0", false)?;
    assert_eq!(driver.peek(1, 4, 1), vec![0b1111_1110]);
    Ok(())
}

#[test]
fn test_bits_sharing_a_byte_are_both_written() -> Result<()> {
    let mut driver = bits();
    driver.fill(1, 4, &[0b1000_0000]);
    let mut records = vec![
        ChannelRecord::write("flag3", TypedValue::Boolean(true)),
        ChannelRecord::write("flag0", TypedValue::Boolean(true)),
    ];
    driver.write(&mut records)?;

    assert!(records.iter().all(|r| r.flag() == Some(ChannelFlag::Success)));
    assert_eq!(driver.peek(1, 4, 1), vec![0b1000_1001]);
    Ok(())
}

#[test]
fn test_update_mixed_with_plain_writes() -> Result<()> {
    let mut driver = bits().options(1, DriverOptions::new(16, Vec::new()));
    driver.fill(1, 20, &[0b0100_0000]);
    let mut records = vec![
        ChannelRecord::write("flag3", TypedValue::Boolean(true)),
        ChannelRecord::write("level", TypedValue::Integer(9)),
        ChannelRecord::write("far", TypedValue::Boolean(true)),
    ];
    driver.write(&mut records)?;

    assert!(records.iter().all(|r| r.flag() == Some(ChannelFlag::Success)));
    assert_eq!(driver.peek(1, 4, 2), vec![0b0000_1000, 9]);
    assert_eq!(driver.peek(1, 20, 1), vec![0b0100_0010]);

    let device = driver.device.borrow();
    // Reads bridge the gap, writes never do.
    assert_eq!(device.transfers_in(Mode::Read), vec![(1, 4, 21)]);
    assert_eq!(device.transfers_in(Mode::Write), vec![(1, 4, 6), (1, 20, 21)]);
    assert_eq!(driver.aggregations, vec![(1, 3)]);
    Ok(())
}

#[test]
fn test_failed_read_aborts_dependent_write() -> Result<()> {
    let mut driver = bits();
    driver.device.borrow_mut().failing_reads.push((1, 4));
    driver.fill(1, 4, &[0xff, 0xff]);
    let mut records = vec![
        ChannelRecord::write("flag3", TypedValue::Boolean(false)),
        ChannelRecord::write("level", TypedValue::Integer(1)),
        ChannelRecord::write("far", TypedValue::Boolean(true)),
    ];
    driver.write(&mut records)?;

    assert_eq!(records[0].flag(), Some(ChannelFlag::Failure));
    assert_eq!(records[1].flag(), Some(ChannelFlag::Failure));
    assert_eq!(records[2].flag(), Some(ChannelFlag::Success));
    assert_eq!(driver.peek(1, 4, 2), vec![0xff, 0xff]);
    assert_eq!(driver.device.borrow().transfers_in(Mode::Write), vec![(1, 20, 21)]);
    Ok(())
}

#[test]
fn test_unfeasible_read_side_fails_update() -> Result<()> {
    let mut driver = bits().options(1, DriverOptions::new(16, vec![10, 11]));
    let mut records = vec![
        ChannelRecord::write("flag3", TypedValue::Boolean(true)),
        ChannelRecord::write("far", TypedValue::Boolean(true)),
    ];
    driver.write(&mut records)?;

    assert!(records.iter().all(|r| r.flag() == Some(ChannelFlag::Failure)));
    assert!(driver.device.borrow().transfers.is_empty());
    Ok(())
}

#[test]
fn test_bit_channels_read_as_booleans() -> Result<()> {
    let mut driver = bits();
    driver.fill(1, 4, &[0b0000_1000]);
    let mut records = vec![
        ChannelRecord::read("flag3", DataType::Boolean),
        ChannelRecord::read("flag0", DataType::Boolean),
    ];
    driver.read(&mut records)?;

    assert_eq!(records[0].value(), Some(&TypedValue::Boolean(true)));
    assert_eq!(records[1].value(), Some(&TypedValue::Boolean(false)));
    Ok(())
}
