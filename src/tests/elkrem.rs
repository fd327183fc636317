use crate::elkrem::{ElkremReceiver, ElkremSender, MAX_INDEX};
use crate::errors::Error;

use super::gen_rand_bytes;

#[test]
fn test_sender_receiver_agree() {
    let sender = ElkremSender::new(gen_rand_bytes::<32>());
    let mut receiver = ElkremReceiver::new();

    for index in 0..=20u64 {
        assert_eq!(receiver.up_to(), index);
        receiver
            .add_next(&sender.at_index(index).unwrap())
            .unwrap();
        assert_eq!(receiver.up_to(), index + 1);
    }
    // every index received so far is reproducible
    for index in 0..=20u64 {
        assert_eq!(
            receiver.at_index(index).unwrap(),
            sender.at_index(index).unwrap()
        );
    }
}

#[test]
fn test_receiver_rejects_wrong_leaf() {
    let sender = ElkremSender::new(gen_rand_bytes::<32>());
    let mut receiver = ElkremReceiver::new();
    receiver.add_next(&sender.at_index(0).unwrap()).unwrap();
    receiver.add_next(&sender.at_index(1).unwrap()).unwrap();

    // index 2 is the parent of 0 and 1; a skipped-ahead node cannot be
    let err = receiver
        .add_next(&sender.at_index(3).unwrap())
        .unwrap_err();
    assert!(matches!(err, Error::HashTreeReject { index: 2 }));
    // and neither can garbage
    let err = receiver.add_next(&gen_rand_bytes::<32>()).unwrap_err();
    assert!(matches!(err, Error::HashTreeReject { index: 2 }));

    // the rejected adds left no trace
    assert_eq!(receiver.up_to(), 2);
    receiver.add_next(&sender.at_index(2).unwrap()).unwrap();
    assert_eq!(receiver.up_to(), 3);
}

#[test]
fn test_receiver_at_index_out_of_range() {
    let sender = ElkremSender::new(gen_rand_bytes::<32>());
    let mut receiver = ElkremReceiver::new();

    let err = receiver.at_index(0).unwrap_err();
    assert!(matches!(
        err,
        Error::HashTreeOutOfRange { index: 0, up_to: 0 }
    ));

    for index in 0..5u64 {
        receiver
            .add_next(&sender.at_index(index).unwrap())
            .unwrap();
    }
    let err = receiver.at_index(5).unwrap_err();
    assert!(matches!(
        err,
        Error::HashTreeOutOfRange { index: 5, up_to: 5 }
    ));
}

#[test]
fn test_sender_index_past_tree_top() {
    let sender = ElkremSender::new(gen_rand_bytes::<32>());
    assert!(sender.at_index(MAX_INDEX).is_ok());
    assert!(matches!(
        sender.at_index(MAX_INDEX + 1),
        Err(Error::HashTreeOutOfRange { .. })
    ));
}

#[test]
fn test_receiver_serialization_round_trip() {
    let sender = ElkremSender::new(gen_rand_bytes::<32>());
    let mut receiver = ElkremReceiver::new();
    for index in 0..=10u64 {
        receiver
            .add_next(&sender.at_index(index).unwrap())
            .unwrap();

        let restored = ElkremReceiver::from_bytes(&receiver.to_bytes()).unwrap();
        assert_eq!(restored, receiver);
        assert_eq!(
            restored.at_index(index).unwrap(),
            sender.at_index(index).unwrap()
        );
    }
}

#[test]
fn test_receiver_from_bytes_rejects_corrupt_input() {
    assert!(matches!(
        ElkremReceiver::from_bytes(&[]),
        Err(Error::MalformedElkrem)
    ));
    // count byte disagrees with the payload length
    let mut bytes = ElkremReceiver::new().to_bytes();
    bytes[0] = 3;
    assert!(matches!(
        ElkremReceiver::from_bytes(&bytes),
        Err(Error::MalformedElkrem)
    ));
}
