use std::thread;

use worklet_rt::{
    message_port, parameter_channel, OutgoingMessage, ParameterUpdate, TryRecvError, TrySendError,
};

#[test]
fn updates_cross_threads_in_fifo_order() {
    let (tx, rx) = parameter_channel(1024);
    let controller = thread::spawn(move || {
        for id in 0..500u32 {
            while tx.set(id, id as f32 * 0.5) == Err(TrySendError::Full) {
                thread::yield_now();
            }
        }
    });

    let mut received = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(update) => received.push(update),
            Err(TryRecvError::Empty) => thread::yield_now(),
            Err(TryRecvError::Disconnected) => break,
        }
    }
    controller.join().unwrap();

    assert_eq!(received.len(), 500);
    for (expected, update) in received.iter().enumerate() {
        assert_eq!(*update, ParameterUpdate::new(expected as u32, expected as f32 * 0.5));
    }
}

#[test]
fn controller_sees_every_message_posted_from_audio_thread() {
    let (tx, rx) = message_port();
    let audio = thread::spawn(move || {
        for block in 0..64u16 {
            tx.post(OutgoingMessage::new(block.to_le_bytes().to_vec()))
                .unwrap();
        }
    });
    audio.join().unwrap();

    let blocks: Vec<u16> = rx
        .iter()
        .map(|message| u16::from_le_bytes([message.as_bytes()[0], message.as_bytes()[1]]))
        .collect();
    assert_eq!(blocks, (0..64).collect::<Vec<_>>());
}
