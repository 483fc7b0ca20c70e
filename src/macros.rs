/// Helper macro for reading locked items
///
/// A poisoned lock still yields its data. Lazily computed state stays usable even when
/// a thread panicked while holding the guard.
///
/// ```rust, ignore
///  let data = read_lock!(my_rwlock);
///  println!("{}", data.some_field);
/// ```
macro_rules! read_lock {
    ($rwlock:expr) => {
        $rwlock
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    };
}

/// Helper macro for writing to locked items
///
/// ```rust, ignore
///  let mut data = write_lock!(my_rwlock);
///  data.some_field = 42;
/// ```
macro_rules! write_lock {
    ($rwlock:expr) => {
        $rwlock
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    };
}

/// Helper macro for writing to locked items through a closure
///
/// ```rust, ignore
///  with_write!(graph.tables, |tables| tables.type_def.clear());
/// ```
macro_rules! with_write {
    ($rwlock:expr, $closure:expr) => {{
        let mut guard = write_lock!($rwlock);
        $closure(&mut *guard)
    }};
}
