use mesh_lattice::algs::communicator::{
    Communicator, LocalComm, NoComm, TAG_POOL_SIZE, TagPool, Wait,
};
use mesh_lattice::mesh_error::MeshLatticeError;

#[test]
fn local_round_trip() {
    let comms = LocalComm::universe(2);
    let tag = 0x1000;
    let _s = comms[0].isend(1, tag, b"hello");
    let got = comms[1].irecv(0, tag, 5).wait().unwrap();
    assert_eq!(&got, b"hello");
}

#[test]
fn local_fifo_order() {
    let comms = LocalComm::universe(2);
    let tag = 0x1001;
    for i in 0..10u8 {
        let _ = comms[0].isend(1, tag, &[i]);
    }
    let out: Vec<u8> = (0..10)
        .map(|_| comms[1].irecv(0, tag, 1).wait().unwrap()[0])
        .collect();
    assert_eq!(out, (0u8..10u8).collect::<Vec<_>>());
}

#[test]
fn tags_keep_messages_apart() {
    let comms = LocalComm::universe(2);
    let _ = comms[0].isend(1, 7, &[7]);
    let _ = comms[0].isend(1, 8, &[8]);
    assert_eq!(comms[1].irecv(0, 8, 1).wait().unwrap(), vec![8]);
    assert_eq!(comms[1].irecv(0, 7, 1).wait().unwrap(), vec![7]);
}

#[test]
fn recv_any_reports_the_source() {
    let comms = LocalComm::universe(3);
    let _ = comms[2].isend(0, 3, &[42, 43]);
    let (from, bytes) = comms[0].recv_any(3).unwrap();
    assert_eq!(from, 2);
    assert_eq!(bytes, vec![42, 43]);
}

#[test]
fn empty_messages_are_delivered() {
    let comms = LocalComm::universe(2);
    let _ = comms[1].isend(0, 9, &[]);
    assert_eq!(comms[0].irecv(1, 9, 0).wait(), Some(Vec::new()));
}

#[test]
fn receive_across_threads() {
    let comms = LocalComm::universe(2);
    std::thread::scope(|s| {
        let rx = s.spawn(|| comms[1].irecv(0, 5, 3).wait().unwrap());
        std::thread::sleep(std::time::Duration::from_millis(10));
        let _ = comms[0].isend(1, 5, &[1, 2, 3]);
        assert_eq!(rx.join().unwrap(), vec![1, 2, 3]);
    });
}

#[test]
fn loopback_single_rank() {
    let comm = NoComm::new();
    assert_eq!((comm.rank(), comm.size()), (0, 1));
    let _ = comm.isend(0, 1, &[5, 6]);
    assert_eq!(comm.irecv(0, 1, 2).wait(), Some(vec![5, 6]));
}

#[test]
fn tag_pool_cycles_and_bounds_outstanding_leases() {
    let pool = TagPool::new(0x2000);
    let first = pool.lease().unwrap().tag();
    let second = pool.lease().unwrap().tag();
    assert_ne!(first, second);

    let held: Vec<_> = (0..TAG_POOL_SIZE).map(|_| pool.lease().unwrap()).collect();
    assert_eq!(pool.outstanding(), TAG_POOL_SIZE);
    assert!(matches!(pool.lease(), Err(MeshLatticeError::TagPoolExhausted(_))));
    drop(held);
    assert_eq!(pool.outstanding(), 0);
    assert!(pool.lease().is_ok());
}
