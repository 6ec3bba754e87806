// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::time::Duration;

use crossbeam_channel::unbounded;
use rowtap_cdc::{CdcConsumer, ChannelHandler, ConsumerState, PollConsumer};
use rowtap_core::{AckPolicy, BatchId, ConsumerConfig, Error, EventType, RowEventType, Value};
use rowtap_testing::{
	Call, CallLog, MockConnector, RecordingHandler, Reply,
	fixture::{self, begin, end, heartbeat},
	wait::wait_for,
};

const BACKOFF: Duration = Duration::from_millis(20);

fn config() -> ConsumerConfig {
	ConsumerConfig::default().with_backoff(BACKOFF).with_max_batch_size(100)
}

fn consumer(connector: MockConnector, handler: RecordingHandler) -> PollConsumer<MockConnector, RecordingHandler> {
	PollConsumer::new(config(), connector, handler)
}

#[test]
fn test_startup_sequence() {
	let log = CallLog::new();
	let consumer = consumer(MockConnector::new(log.clone()), RecordingHandler::new(log.clone()));

	consumer.start().unwrap();
	wait_for(|| log.fetches() >= 1, "worker should fetch");
	consumer.stop();
	consumer.join().unwrap();

	let calls = log.calls();
	assert_eq!(
		&calls[..4],
		&[Call::Connect, Call::Subscribe(r".*\..*".to_string()), Call::Rollback, Call::Fetch(100)]
	);
}

#[test]
fn test_start_twice_spawns_one_worker() {
	let log = CallLog::new();
	let consumer = consumer(MockConnector::new(log.clone()), RecordingHandler::new(log.clone()));

	consumer.start().unwrap();
	consumer.start().unwrap();
	assert_eq!(consumer.state(), ConsumerState::Running);

	wait_for(|| log.fetches() >= 2, "worker should keep polling");
	consumer.stop();
	consumer.join().unwrap();

	assert_eq!(log.count(|c| *c == Call::Connect), 1);
	assert_eq!(log.count(|c| *c == Call::Disconnect), 1);
}

#[test]
fn test_concurrent_start_spawns_one_worker() {
	let log = CallLog::new();
	let consumer = consumer(MockConnector::new(log.clone()), RecordingHandler::new(log.clone()));

	std::thread::scope(|s| {
		for _ in 0..8 {
			s.spawn(|| consumer.start().unwrap());
		}
	});

	wait_for(|| log.fetches() >= 1, "worker should fetch");
	consumer.stop();
	consumer.join().unwrap();

	assert_eq!(log.count(|c| *c == Call::Connect), 1);
}

#[test]
fn test_stop_before_start_is_noop() {
	let log = CallLog::new();
	let consumer = consumer(MockConnector::new(log.clone()), RecordingHandler::new(log.clone()));

	consumer.stop();
	consumer.stop();

	assert_eq!(consumer.state(), ConsumerState::Idle);
	assert!(log.calls().is_empty());
	consumer.join().unwrap();
}

#[test]
fn test_start_rejects_invalid_config() {
	let log = CallLog::new();
	let consumer = PollConsumer::new(
		config().with_max_batch_size(0),
		MockConnector::new(log.clone()),
		RecordingHandler::new(log.clone()),
	);

	let err = consumer.start().unwrap_err();
	assert!(matches!(err, Error::Config(_)));
	assert_eq!(consumer.state(), ConsumerState::Idle);
	assert!(log.calls().is_empty());
}

#[test]
fn test_stop_twice() {
	let log = CallLog::new();
	let consumer = consumer(MockConnector::new(log.clone()), RecordingHandler::new(log.clone()));

	consumer.start().unwrap();
	wait_for(|| log.fetches() >= 1, "worker should fetch");

	consumer.stop();
	consumer.stop();
	assert_eq!(consumer.state(), ConsumerState::Stopped);
	consumer.join().unwrap();

	assert_eq!(log.count(|c| *c == Call::Disconnect), 1);
}

#[test]
fn test_stopped_consumer_does_not_restart() {
	let log = CallLog::new();
	let consumer = consumer(MockConnector::new(log.clone()), RecordingHandler::new(log.clone()));

	consumer.start().unwrap();
	wait_for(|| log.fetches() >= 1, "worker should fetch");
	consumer.stop();
	consumer.join().unwrap();

	consumer.start().unwrap();
	assert_eq!(consumer.state(), ConsumerState::Stopped);
	assert_eq!(log.count(|c| *c == Call::Connect), 1);
}

#[test]
fn test_disconnects_once_and_stops_fetching() {
	let log = CallLog::new();
	let consumer = consumer(MockConnector::new(log.clone()), RecordingHandler::new(log.clone()));

	consumer.start().unwrap();
	wait_for(|| log.fetches() >= 3, "worker should keep polling");
	consumer.stop();
	consumer.join().unwrap();

	let calls = log.calls();
	assert_eq!(calls.last(), Some(&Call::Disconnect));
	assert_eq!(log.count(|c| *c == Call::Disconnect), 1);

	let fetches = log.fetches();
	std::thread::sleep(BACKOFF * 3);
	assert_eq!(log.fetches(), fetches);
}

#[test]
fn test_drop_stops_worker() {
	let log = CallLog::new();
	{
		let consumer = consumer(MockConnector::new(log.clone()), RecordingHandler::new(log.clone()));
		consumer.start().unwrap();
		wait_for(|| log.fetches() >= 1, "worker should fetch");
	}

	assert_eq!(log.calls().last(), Some(&Call::Disconnect));
}

#[test]
fn test_handler_receives_whole_batch_in_order() {
	let log = CallLog::new();
	let handler = RecordingHandler::new(log.clone());
	let connector = MockConnector::new(log.clone()).with_batch(vec![
		begin(),
		fixture::insert_user(1, "alice"),
		fixture::update_user(1, "alice", "alicia"),
		fixture::ddl(RowEventType::Alter, "ALTER TABLE users ADD email TEXT"),
		fixture::delete_user(2, "bob"),
		heartbeat(),
		fixture::insert_user(3, "carol"),
		fixture::insert_user(4, "dave"),
		end(),
	]);
	let consumer = consumer(connector, handler.clone());

	consumer.start().unwrap();
	wait_for(|| log.acks().contains(&BatchId(1)), "batch should be acked");
	consumer.stop();
	consumer.join().unwrap();

	assert_eq!(handler.invocations(), 1);
	let received = handler.received();
	let types: Vec<_> = received[0].iter().map(|e| e.event_type()).collect();
	assert_eq!(
		types,
		vec![EventType::Insert, EventType::Update, EventType::Delete, EventType::Insert, EventType::Insert]
	);

	let resolved = log.position(&Call::Resolve(5)).unwrap();
	let acked = log.position(&Call::Ack(BatchId(1))).unwrap();
	assert!(resolved < acked);

	let stats = consumer.stats();
	assert_eq!(stats.batches, 1);
	assert_eq!(stats.events, 5);
	assert_eq!(stats.acked, 1);
	assert_eq!(stats.failures, 0);
}

#[test]
fn test_column_mapping() {
	let log = CallLog::new();
	let handler = RecordingHandler::new(log.clone());
	let connector = MockConnector::new(log.clone()).with_batch(vec![
		fixture::insert_user(1, "alice"),
		fixture::update_user(1, "alice", "alicia"),
		fixture::delete_user(1, "alicia"),
	]);
	let consumer = consumer(connector, handler.clone());

	consumer.start().unwrap();
	wait_for(|| handler.invocations() == 1, "handler should be called");
	consumer.stop();
	consumer.join().unwrap();

	let events = &handler.received()[0];

	let insert = &events[0];
	assert_eq!((insert.schema(), insert.table()), ("shop", "users"));
	assert!(insert.rows_before().is_empty());
	assert_eq!(insert.rows_after()[0]["id"], Value::int8(1));
	assert_eq!(insert.rows_after()[0]["name"], Value::utf8("alice"));

	let update = &events[1];
	assert_eq!(update.rows_before()[0]["name"], Value::utf8("alice"));
	assert_eq!(update.rows_after()[0]["name"], Value::utf8("alicia"));
	let columns: Vec<_> = update.rows_after()[0].keys().cloned().collect();
	assert_eq!(columns, vec!["id", "name"]);

	let delete = &events[2];
	assert!(delete.rows_after().is_empty());
	assert_eq!(delete.rows_before()[0]["name"], Value::utf8("alicia"));
}

#[test]
fn test_empty_batch_backs_off() {
	let log = CallLog::new();
	let handler = RecordingHandler::new(log.clone());
	let backoff = Duration::from_millis(100);
	let consumer = PollConsumer::new(
		config().with_backoff(backoff),
		MockConnector::new(log.clone()),
		handler.clone(),
	);

	consumer.start().unwrap();
	wait_for(|| log.fetches() >= 3, "worker should keep polling");
	consumer.stop();
	consumer.join().unwrap();

	let fetched: Vec<_> =
		log.timed().into_iter().filter(|(_, c)| matches!(c, Call::Fetch(_))).map(|(at, _)| at).collect();
	for pair in fetched.windows(2) {
		assert!(pair[1] - pair[0] >= backoff);
	}

	assert_eq!(handler.invocations(), 0);
	assert!(log.acks().is_empty());
}

#[test]
fn test_batch_without_row_changes_is_acked() {
	let log = CallLog::new();
	let handler = RecordingHandler::new(log.clone());
	let connector = MockConnector::new(log.clone()).with_batch(vec![
		begin(),
		fixture::ddl(RowEventType::Create, "CREATE TABLE users (id INT)"),
		end(),
	]);
	let consumer = consumer(connector, handler.clone());

	consumer.start().unwrap();
	wait_for(|| log.acks().contains(&BatchId(1)), "batch should be acked");
	consumer.stop();
	consumer.join().unwrap();

	assert_eq!(handler.invocations(), 0);
}

#[test]
fn test_handler_failure_is_acked_by_default() {
	let log = CallLog::new();
	let handler = RecordingHandler::new(log.clone()).reply(Reply::Fail("downstream unavailable".into()));
	let connector = MockConnector::new(log.clone())
		.with_batch(vec![fixture::insert_user(1, "alice")])
		.with_batch(vec![fixture::insert_user(2, "bob")]);
	let consumer = consumer(connector, handler.clone());

	consumer.start().unwrap();
	wait_for(|| log.acks().contains(&BatchId(2)), "second batch should be acked");
	consumer.stop();
	consumer.join().unwrap();

	assert_eq!(handler.invocations(), 2);
	assert_eq!(log.acks(), vec![BatchId(1), BatchId(2)]);
	assert_eq!(consumer.stats().failures, 1);
}

#[test]
fn test_handler_panic_is_contained() {
	let log = CallLog::new();
	let handler = RecordingHandler::new(log.clone()).reply(Reply::Panic("boom".into()));
	let connector = MockConnector::new(log.clone())
		.with_batch(vec![fixture::insert_user(1, "alice")])
		.with_batch(vec![fixture::insert_user(2, "bob")]);
	let consumer = consumer(connector, handler.clone());

	consumer.start().unwrap();
	wait_for(|| log.acks().contains(&BatchId(2)), "second batch should be acked");
	assert_eq!(consumer.state(), ConsumerState::Running);
	consumer.stop();
	consumer.join().unwrap();

	assert_eq!(handler.invocations(), 2);
}

#[test]
fn test_failed_batch_is_redelivered_on_success_policy() {
	let log = CallLog::new();
	let handler = RecordingHandler::new(log.clone()).reply(Reply::Fail("downstream unavailable".into()));
	let connector = MockConnector::new(log.clone()).with_batch(vec![fixture::insert_user(1, "alice")]);
	let consumer =
		PollConsumer::new(config().with_ack_policy(AckPolicy::OnSuccess), connector, handler.clone());

	consumer.start().unwrap();
	wait_for(|| log.acks().contains(&BatchId(1)), "batch should be acked after redelivery");
	consumer.stop();
	consumer.join().unwrap();

	assert_eq!(handler.invocations(), 2);
	assert_eq!(handler.received()[0], handler.received()[1]);
	assert_eq!(log.acks(), vec![BatchId(1)]);
	// startup rollback plus the one for the failed batch
	assert_eq!(log.count(|c| *c == Call::Rollback), 2);

	let stats = consumer.stats();
	assert_eq!(stats.rolled_back, 1);
	assert_eq!(stats.failures, 1);
}

#[test]
fn test_failed_ack_is_covered_by_next_batch() {
	let log = CallLog::new();
	let handler = RecordingHandler::new(log.clone());
	let connector = MockConnector::new(log.clone())
		.failing_acks(1)
		.with_batch(vec![fixture::insert_user(1, "alice")])
		.with_batch(vec![fixture::insert_user(2, "bob")]);
	let feed = connector.feed();
	let consumer = consumer(connector, handler.clone());

	consumer.start().unwrap();
	wait_for(|| log.acks().contains(&BatchId(2)), "second batch should be acked");
	consumer.stop();
	consumer.join().unwrap();

	assert_eq!(log.acks(), vec![BatchId(1), BatchId(2)]);
	assert_eq!(handler.invocations(), 2);
	assert!(feed.outstanding().is_empty());
	assert_eq!(feed.pending(), 0);

	let stats = consumer.stats();
	assert_eq!(stats.batches, 2);
	assert_eq!(stats.acked, 1);
	assert_eq!(stats.failures, 0);
	assert_eq!(consumer.state(), ConsumerState::Stopped);
}

#[test]
fn test_malformed_batch_is_acked_without_handler() {
	let log = CallLog::new();
	let handler = RecordingHandler::new(log.clone());
	let connector = MockConnector::new(log.clone())
		.with_batch(vec![fixture::insert_user(1, "alice"), fixture::malformed()])
		.with_batch(vec![fixture::insert_user(2, "bob")]);
	let consumer = consumer(connector, handler.clone());

	consumer.start().unwrap();
	wait_for(|| log.acks().contains(&BatchId(2)), "second batch should be acked");
	consumer.stop();
	consumer.join().unwrap();

	assert_eq!(handler.invocations(), 1);
	assert_eq!(handler.received()[0][0].rows_after()[0]["name"], Value::utf8("bob"));
}

#[test]
fn test_fetch_errors_are_retried() {
	let log = CallLog::new();
	let handler = RecordingHandler::new(log.clone());
	let connector =
		MockConnector::new(log.clone()).failing_fetches(2).with_batch(vec![fixture::insert_user(1, "alice")]);
	let consumer = consumer(connector, handler.clone());

	consumer.start().unwrap();
	wait_for(|| handler.invocations() == 1, "handler should be called after fetch errors");
	consumer.stop();
	consumer.join().unwrap();

	assert!(log.fetches() >= 3);
}

#[test]
fn test_connect_failure_stops_consumer() {
	let log = CallLog::new();
	let handler = RecordingHandler::new(log.clone());
	let connector = MockConnector::new(log.clone()).failing_connect("connection refused");
	let consumer = consumer(connector, handler.clone());

	consumer.start().unwrap();
	let err = consumer.join().unwrap_err();

	assert!(matches!(err, Error::Connection { .. }));
	assert_eq!(err.code(), "CDC_001");
	assert_eq!(consumer.state(), ConsumerState::Stopped);
	assert_eq!(log.calls(), vec![Call::Connect, Call::Disconnect]);
	assert_eq!(handler.invocations(), 0);
}

#[test]
fn test_channel_handler_forwards_events() {
	let log = CallLog::new();
	let (sender, receiver) = unbounded();
	let connector = MockConnector::new(log.clone());
	let feed = connector.feed();
	let consumer = PollConsumer::new(config(), connector, ChannelHandler::new(sender));

	consumer.start().unwrap();
	wait_for(|| log.fetches() >= 1, "worker should fetch");
	feed.push(vec![fixture::insert_user(7, "grace")]);

	let events = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
	assert_eq!(events.len(), 1);
	assert_eq!(events[0].rows_after()[0]["id"], Value::int8(7));

	consumer.stop();
	consumer.join().unwrap();
}
