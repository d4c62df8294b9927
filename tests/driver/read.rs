use fieldbus_blocks::binary::BinaryData;
use fieldbus_blocks::{
    BlockDriver, ChannelFlag, ChannelRecord, DataType, DriverOptions, Error, Mode, Result,
    TypedValue,
};

use crate::mock::{Layout, TestDriver};

fn message(record: &ChannelRecord) -> &str {
    record
        .status()
        .and_then(|s| s.message.as_deref())
        .unwrap_or_default()
}

fn registers() -> TestDriver {
    TestDriver::new()
        .channel("a", 1, Layout::Data(0, BinaryData::UINT16_BE))
        .channel("b", 1, Layout::Data(2, BinaryData::UINT16_BE))
        .channel("c", 1, Layout::Data(10, BinaryData::UINT8))
}

#[test]
fn test_read_merges_channels_of_one_domain() -> Result<()> {
    let mut driver = registers();
    driver.fill(1, 0, &[0x01, 0x02, 0x03, 0x04]);
    driver.fill(1, 10, &[0x2a]);

    let mut records = vec![
        ChannelRecord::read("c", DataType::Long),
        ChannelRecord::read("a", DataType::Integer),
        ChannelRecord::read("b", DataType::String),
    ];
    driver.read(&mut records)?;

    assert_eq!(records[0].value(), Some(&TypedValue::Long(42)));
    assert_eq!(records[1].value(), Some(&TypedValue::Integer(0x0102)));
    assert_eq!(records[2].value(), Some(&TypedValue::String("772".into())));
    assert!(records.iter().all(|r| r.flag() == Some(ChannelFlag::Success)));

    let device = driver.device.borrow();
    assert_eq!(device.transfers_in(Mode::Read), vec![(1, 0, 4), (1, 10, 11)]);
    assert_eq!(driver.aggregations, vec![(1, 2)]);
    Ok(())
}

#[test]
fn test_read_bridges_minimum_gap() -> Result<()> {
    let mut driver = TestDriver::new()
        .channel("x", 1, Layout::Text(0, 3))
        .channel("y", 1, Layout::Text(5, 2))
        .channel("z", 1, Layout::Text(9, 3))
        .channel("u", 2, Layout::Text(0, 3))
        .channel("v", 2, Layout::Text(5, 2))
        .channel("w", 2, Layout::Text(9, 3))
        .options(1, DriverOptions::new(3, Vec::new()))
        .options(2, DriverOptions::new(1, Vec::new()));
    driver.fill(1, 0, b"abc");

    let mut records: Vec<ChannelRecord> = ["x", "y", "z", "u", "v", "w"]
        .iter()
        .map(|name| ChannelRecord::read(*name, DataType::String))
        .collect();
    driver.read(&mut records)?;

    assert_eq!(records[0].value(), Some(&TypedValue::String("abc".into())));
    let device = driver.device.borrow();
    assert_eq!(
        device.transfers_in(Mode::Read),
        vec![(1, 0, 12), (2, 0, 3), (2, 5, 7), (2, 9, 12)]
    );
    Ok(())
}

#[test]
fn test_prepared_read_reuses_aggregation() -> Result<()> {
    let mut driver = registers();
    let mut prepared = driver.prepare_read(vec![
        ChannelRecord::read("a", DataType::Integer),
        ChannelRecord::read("c", DataType::Integer),
    ]);
    assert_eq!(driver.connects, 0);
    assert!(prepared.records().iter().all(|r| r.status().is_none()));
    assert_eq!(prepared.plan().task_lists().len(), 1);

    driver.fill(1, 0, &[0x00, 0x07]);
    let records = prepared.execute(&mut driver)?;
    assert_eq!(records[0].value(), Some(&TypedValue::Integer(7)));
    assert_eq!(records[1].value(), Some(&TypedValue::Integer(0)));

    driver.fill(1, 10, &[0x09]);
    let records = prepared.execute(&mut driver)?;
    assert_eq!(records[1].value(), Some(&TypedValue::Integer(9)));

    assert_eq!(driver.connects, 2);
    assert_eq!(driver.aggregations.len(), 1);
    assert_eq!(driver.factories.borrow().as_slice(), &[(1, Mode::Read)]);
    assert_eq!(driver.device.borrow().transfers_in(Mode::Read).len(), 4);
    Ok(())
}

#[test]
fn test_failed_poll_drops_previous_value() -> Result<()> {
    let mut driver = registers();
    driver.fill(1, 0, &[0x00, 0x07]);
    let mut prepared = driver.prepare_read(vec![
        ChannelRecord::read("a", DataType::Integer),
        ChannelRecord::read("missing", DataType::Integer),
    ]);

    let records = prepared.execute(&mut driver)?;
    assert_eq!(records[0].value(), Some(&TypedValue::Integer(7)));

    driver.device.borrow_mut().failing_reads.push((1, 0));
    let records = prepared.execute(&mut driver)?;
    assert_eq!(records[0].flag(), Some(ChannelFlag::Failure));
    assert!(records[0].value().is_none());
    assert!(message(&records[0]).contains("Transport failure"));
    assert!(records[1].value().is_none());
    Ok(())
}

#[test]
fn test_decode_failure_drops_previous_value() -> Result<()> {
    let mut driver = TestDriver::new().channel("wide", 1, Layout::Data(0, BinaryData::UINT32_BE));
    let mut prepared = driver.prepare_read(vec![ChannelRecord::read("wide", DataType::Integer)]);

    driver.fill(1, 0, &[0, 0, 0, 5]);
    assert_eq!(prepared.execute(&mut driver)?[0].value(), Some(&TypedValue::Integer(5)));

    driver.fill(1, 0, &[0xff, 0xff, 0xff, 0xff]);
    let records = prepared.execute(&mut driver)?;
    assert_eq!(records[0].flag(), Some(ChannelFlag::Failure));
    assert!(records[0].value().is_none());
    Ok(())
}

fn unfeasible() -> TestDriver {
    TestDriver::new()
        .channel("low", 1, Layout::Data(0, BinaryData::UINT32_BE))
        .channel("high", 1, Layout::Data(4, BinaryData::UINT16_BE))
        .options(1, DriverOptions::new(0, vec![5, 10]))
}

#[test]
fn test_read_unfeasible_domain_fails_every_channel() -> Result<()> {
    let mut driver = unfeasible();
    let mut records = vec![
        ChannelRecord::read("low", DataType::Long),
        ChannelRecord::read("high", DataType::Integer),
    ];
    driver.read(&mut records)?;

    for record in &records {
        assert_eq!(record.flag(), Some(ChannelFlag::Failure));
        assert!(record.value().is_none());
        assert!(message(record).contains("Unfeasible"), "{}", message(record));
    }
    assert!(driver.device.borrow().transfers.is_empty());
    assert!(driver.aggregations.is_empty());
    Ok(())
}

#[test]
fn test_prepared_read_unfeasible_domain_fails_on_execute() -> Result<()> {
    let mut driver = unfeasible();
    let mut prepared = driver.prepare_read(vec![
        ChannelRecord::read("low", DataType::Long),
        ChannelRecord::read("high", DataType::Integer),
    ]);
    assert_eq!(prepared.plan().failures().len(), 2);

    let records = prepared.execute(&mut driver)?;
    assert!(records.iter().all(|r| r.flag() == Some(ChannelFlag::Failure)));
    Ok(())
}

#[test]
fn test_unfeasible_domain_does_not_affect_others() -> Result<()> {
    let mut driver = unfeasible()
        .channel("e", 2, Layout::Data(0, BinaryData::UINT8))
        .channel("f", 3, Layout::Data(8, BinaryData::INT8));
    driver.fill(2, 0, &[5]);
    driver.fill(3, 8, &[0xff]);

    let mut records = vec![
        ChannelRecord::read("low", DataType::Long),
        ChannelRecord::read("e", DataType::Integer),
        ChannelRecord::read("high", DataType::Integer),
        ChannelRecord::read("f", DataType::Integer),
    ];
    driver.read(&mut records)?;

    assert_eq!(records[0].flag(), Some(ChannelFlag::Failure));
    assert_eq!(records[2].flag(), Some(ChannelFlag::Failure));
    assert_eq!(records[1].value(), Some(&TypedValue::Integer(5)));
    assert_eq!(records[3].value(), Some(&TypedValue::Integer(-1)));
    assert_eq!(driver.aggregations, vec![(2, 1), (3, 1)]);
    Ok(())
}

#[test]
fn test_unknown_channel_fails_alone() -> Result<()> {
    let mut driver = registers();
    let mut records = vec![
        ChannelRecord::read("missing", DataType::Integer),
        ChannelRecord::read("a", DataType::Integer),
    ];
    driver.read(&mut records)?;

    assert_eq!(records[0].flag(), Some(ChannelFlag::Failure));
    assert!(message(&records[0]).contains("unknown channel"));
    assert_eq!(records[1].flag(), Some(ChannelFlag::Success));
    Ok(())
}

#[test]
fn test_transport_failure_fails_its_transfer_only() -> Result<()> {
    let mut driver = registers();
    driver.device.borrow_mut().failing_reads.push((1, 10));

    let mut records = vec![
        ChannelRecord::read("a", DataType::Integer),
        ChannelRecord::read("c", DataType::Integer),
    ];
    driver.read(&mut records)?;

    assert_eq!(records[0].flag(), Some(ChannelFlag::Success));
    assert_eq!(records[1].flag(), Some(ChannelFlag::Failure));
    assert!(message(&records[1]).contains("Transport failure"));
    Ok(())
}

#[test]
fn test_decode_failure_fails_one_channel() -> Result<()> {
    let mut driver = TestDriver::new()
        .channel("wide", 1, Layout::Data(20, BinaryData::UINT32_BE))
        .channel("next", 1, Layout::Data(24, BinaryData::UINT8));
    driver.fill(1, 20, &[0xff, 0xff, 0xff, 0xff, 0x01]);

    let mut records = vec![
        ChannelRecord::read("wide", DataType::Integer),
        ChannelRecord::read("next", DataType::Integer),
    ];
    driver.read(&mut records)?;

    assert_eq!(records[0].flag(), Some(ChannelFlag::Failure));
    assert!(message(&records[0]).contains("decode"));
    assert_eq!(records[1].value(), Some(&TypedValue::Integer(1)));
    assert_eq!(driver.device.borrow().transfers_in(Mode::Read), vec![(1, 20, 25)]);
    Ok(())
}

#[test]
fn test_connection_failure_is_returned() {
    let mut driver = registers();
    driver.refuse_connection = true;
    let mut records = vec![ChannelRecord::read("a", DataType::Integer)];

    assert!(matches!(driver.read(&mut records), Err(Error::Connection(_))));
    assert!(records[0].status().is_none());
}
