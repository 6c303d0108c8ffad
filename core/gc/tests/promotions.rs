use ratjs_gc::{force_collect, Finalize, Gc, GcCell, Trace};

#[derive(Trace, Finalize)]
struct Node {
    value: i32,
    next: GcCell<Option<Gc<Node>>>,
}

#[test]
fn a_cycle_is_reclaimed_once_unrooted() {
    let a = Gc::new(Node {
        value: 1,
        next: GcCell::new(None),
    });
    let b = Gc::new(Node {
        value: 2,
        next: GcCell::new(Some(a.clone())),
    });
    *a.next.borrow_mut() = Some(b.clone());

    force_collect();
    assert_eq!(a.value, 1);
    assert_eq!(b.value, 2);

    drop(a);
    drop(b);
    force_collect();
}
