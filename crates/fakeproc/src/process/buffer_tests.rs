// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;
use std::time::Duration;

#[test]
fn pipe_reader_sees_data_after_rewind() {
    let pipe = PipeReader::new();
    pipe.append(b"hello ");
    pipe.append(b"world");

    let mut reader = pipe.clone();
    let mut out = String::new();
    reader.read_to_string(&mut out).unwrap();
    assert_eq!(out, "", "cursor sits at the end until rewound");

    pipe.rewind();
    reader.read_to_string(&mut out).unwrap();
    assert_eq!(out, "hello world");
    assert_eq!(pipe.position(), 11);
    assert_eq!(pipe.contents(), b"hello world");
}

#[test]
fn pipe_reader_reads_in_chunks() {
    let pipe = PipeReader::new();
    pipe.append(b"abcdef");
    pipe.rewind();

    let mut reader = pipe.clone();
    let mut buf = [0u8; 4];
    assert_eq!(reader.read(&mut buf).unwrap(), 4);
    assert_eq!(&buf, b"abcd");
    assert_eq!(reader.read(&mut buf).unwrap(), 2);
    assert_eq!(&buf[..2], b"ef");
    assert_eq!(reader.read(&mut buf).unwrap(), 0);
}

#[tokio::test]
async fn stream_read_waits_for_eof() {
    let stream = StreamReader::new();
    let writer = stream.clone();
    let feeder = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        writer.feed_data(b"late").unwrap();
        writer.feed_eof();
    });

    stream.feed_data(b"early ").unwrap();
    assert_eq!(stream.read().await, b"early late");
    assert!(stream.at_eof());
    feeder.await.unwrap();
}

#[tokio::test]
async fn stream_readline_splits_on_newline() {
    let stream = StreamReader::new();
    stream.feed_data(b"one\ntwo\nrest").unwrap();
    stream.feed_eof();

    assert_eq!(stream.readline().await, b"one\n");
    assert_eq!(stream.readline().await, b"two\n");
    assert_eq!(stream.readline().await, b"rest");
    assert_eq!(stream.readline().await, b"");
    assert!(stream.at_eof());
}

#[tokio::test]
async fn stream_read_chunk_returns_available_bytes() {
    let stream = StreamReader::new();
    stream.feed_data(b"abc").unwrap();
    assert_eq!(stream.read_chunk(2).await, b"ab");
    assert_eq!(stream.read_chunk(10).await, b"c");
    stream.feed_eof();
    assert_eq!(stream.read_chunk(10).await, b"");
}

#[test]
fn feeding_after_eof_is_an_error() {
    let stream = StreamReader::new();
    stream.feed_eof();
    let err = stream.feed_data(b"x").unwrap_err();
    assert!(matches!(err, FakeProcessError::Internal(_)));
    // empty feeds are ignored
    stream.feed_data(b"").unwrap();
}

#[test]
fn pipe_seal_dispatches_by_kind() {
    let memory = PipeReader::new();
    let pipe = Pipe::Memory(memory.clone());
    pipe.write(b"data").unwrap();
    assert_eq!(memory.position(), 4);
    pipe.seal();
    assert_eq!(memory.position(), 0);

    let stream = StreamReader::new();
    let pipe = Pipe::Stream(stream.clone());
    pipe.write(b"data").unwrap();
    assert!(!stream.at_eof());
    pipe.seal();
    assert!(pipe.write(b"more").is_err());
}

#[test]
fn normalize_newlines_collapses_crlf_only() {
    assert_eq!(normalize_newlines(b"a\r\nb\r\n".to_vec()), b"a\nb\n");
    assert_eq!(normalize_newlines(b"a\rb\n".to_vec()), b"a\rb\n");
    assert_eq!(normalize_newlines(b"plain".to_vec()), b"plain");
}
