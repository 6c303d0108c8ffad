use ratjs_gc::{force_collect, Gc, GcTester};

#[test]
fn gc_basic_pointer_alloc() {
    let gc = Gc::new(16u8);

    force_collect();
    GcTester::assert_youth_bytes_allocated();
    assert_eq!(*gc, 16);

    drop(gc);
    force_collect();
}

#[test]
fn gc_cell_allocation() {
    let cell = Gc::new(ratjs_gc::GcCell::new(Vec::<u8>::new()));

    for _ in 0..259 {
        cell.borrow_mut().push(0);
    }

    assert_eq!(cell.borrow().len(), 259);
}
