//! Send/Sync guarantees for core types.

use femtogelf::{
    GelfAppender, GelfEncoder, GelfHttpSender, GelfTcpSender, GelfUdpChunker, GelfUdpSender,
    HttpSenderBuilder, Interrupt, SimpleObjectPool, TcpSenderBuilder, UdpSenderBuilder,
    tcp::TcpConnection,
};
use rstest::rstest;
use static_assertions::assert_impl_all;

#[rstest]
fn builders_are_send_sync() {
    assert_impl_all!(UdpSenderBuilder: Send, Sync);
    assert_impl_all!(TcpSenderBuilder: Send, Sync);
    assert_impl_all!(HttpSenderBuilder: Send, Sync);
}

#[rstest]
fn components_are_send_sync() {
    assert_impl_all!(GelfEncoder: Send, Sync);
    assert_impl_all!(GelfUdpChunker: Send, Sync);
    assert_impl_all!(GelfUdpSender: Send, Sync);
    assert_impl_all!(GelfTcpSender: Send, Sync);
    assert_impl_all!(GelfHttpSender: Send, Sync);
    assert_impl_all!(GelfAppender: Send, Sync);
    assert_impl_all!(SimpleObjectPool<TcpConnection>: Send, Sync);
    assert_impl_all!(Interrupt: Send, Sync);
}
