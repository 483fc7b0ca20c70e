use crate::{
    builder::TokenRemap,
    metadata::{
        graph::ModuleGraph,
        tables::{MetadataTables, SortedRow, TableRow},
        token::Token,
    },
};

/// Staging area for the rows of one table while a module is rebuilt.
///
/// A flush replaces the contents of the target table with the buffered rows and empties the
/// buffer. The returned [`TokenRemap`] maps every token handed out by [`TableBuffer::add`] to
/// the token of the row after the flush.
pub trait TableBuffer {
    /// Row type of the table.
    type Row: TableRow;

    /// Add a row. `original_rid` is the row's id in the source module, 0 for a new row.
    ///
    /// The returned token is final for append buffers and provisional for sorted ones.
    fn add(&mut self, row: Self::Row, original_rid: u32) -> Token;

    /// Row previously added under `rid`.
    fn get(&self, rid: u32) -> Option<&Self::Row>;

    /// Replace the row previously added under `rid`, returning the old row.
    fn set(&mut self, rid: u32, row: Self::Row) -> Option<Self::Row>;

    /// Number of buffered rows.
    fn len(&self) -> usize;

    /// Whether the buffer is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every buffered row.
    fn clear(&mut self);

    /// Commit the rows into their table in final order.
    fn flush_to_table(&mut self, tables: &mut MetadataTables) -> TokenRemap;

    /// Commit the rows into the graph's tables and drop cached members, whose rows may have
    /// moved.
    fn flush_to_graph(&mut self, graph: &ModuleGraph) -> TokenRemap {
        let remap = {
            let mut tables = graph.tables_mut();
            self.flush_to_table(&mut tables)
        };
        graph.clear_cache();
        remap
    }
}

fn commit<R: TableRow>(
    tables: &mut MetadataTables,
    rows: Vec<(R, u32)>,
    provisional_rids: impl Iterator<Item = u32>,
) -> TokenRemap {
    let table = R::table_mut(tables);
    table.clear();

    let mut remap = TokenRemap::new();
    for ((row, original_rid), provisional) in rows.into_iter().zip(provisional_rids) {
        let final_token = table.push(row);
        remap.insert(Token::from_parts(R::TABLE, provisional), final_token);
        if original_rid != 0 {
            remap.insert_original(Token::from_parts(R::TABLE, original_rid), final_token);
        }
    }

    log::debug!(
        "flushed {} {:?} row(s), {} moved",
        remap.len(),
        R::TABLE,
        remap.moved()
    );
    remap
}

fn slot<R>(rows: &[(R, u32)], rid: u32) -> Option<usize> {
    let index = rid.checked_sub(1)? as usize;
    (index < rows.len()).then_some(index)
}

/// Buffer that keeps rows in insertion order; row ids are final on add.
#[derive(Debug, Clone)]
pub struct AppendTableBuffer<R> {
    rows: Vec<(R, u32)>,
}

impl<R> Default for AppendTableBuffer<R> {
    fn default() -> Self {
        AppendTableBuffer { rows: Vec::new() }
    }
}

impl<R: TableRow> AppendTableBuffer<R> {
    /// An empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: TableRow> TableBuffer for AppendTableBuffer<R> {
    type Row = R;

    fn add(&mut self, mut row: R, original_rid: u32) -> Token {
        let rid = self.rows.len() as u32 + 1;
        row.set_rid(rid);
        self.rows.push((row, original_rid));
        Token::from_parts(R::TABLE, rid)
    }

    fn get(&self, rid: u32) -> Option<&R> {
        slot(&self.rows, rid).map(|index| &self.rows[index].0)
    }

    fn set(&mut self, rid: u32, mut row: R) -> Option<R> {
        let index = slot(&self.rows, rid)?;
        row.set_rid(rid);
        Some(std::mem::replace(&mut self.rows[index].0, row))
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn clear(&mut self) {
        self.rows.clear();
    }

    fn flush_to_table(&mut self, tables: &mut MetadataTables) -> TokenRemap {
        let rows = std::mem::take(&mut self.rows);
        let count = rows.len() as u32;
        commit(tables, rows, 1..=count)
    }
}

/// Buffer for tables that must be sorted by a key column.
///
/// Row ids handed out by [`TableBuffer::add`] are provisional until the flush orders the rows by
/// [`SortedRow::sort_key`]. Rows with equal keys keep their insertion order.
#[derive(Debug, Clone)]
pub struct SortedTableBuffer<R> {
    rows: Vec<(R, u32)>,
}

impl<R> Default for SortedTableBuffer<R> {
    fn default() -> Self {
        SortedTableBuffer { rows: Vec::new() }
    }
}

impl<R: SortedRow> SortedTableBuffer<R> {
    /// An empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: SortedRow> TableBuffer for SortedTableBuffer<R> {
    type Row = R;

    fn add(&mut self, mut row: R, original_rid: u32) -> Token {
        let rid = self.rows.len() as u32 + 1;
        row.set_rid(rid);
        self.rows.push((row, original_rid));
        Token::from_parts(R::TABLE, rid)
    }

    fn get(&self, rid: u32) -> Option<&R> {
        slot(&self.rows, rid).map(|index| &self.rows[index].0)
    }

    fn set(&mut self, rid: u32, mut row: R) -> Option<R> {
        let index = slot(&self.rows, rid)?;
        row.set_rid(rid);
        Some(std::mem::replace(&mut self.rows[index].0, row))
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn clear(&mut self) {
        self.rows.clear();
    }

    fn flush_to_table(&mut self, tables: &mut MetadataTables) -> TokenRemap {
        let mut rows: Vec<(u32, (R, u32))> = std::mem::take(&mut self.rows)
            .into_iter()
            .zip(1u32..)
            .map(|(entry, provisional)| (provisional, entry))
            .collect();
        rows.sort_by_key(|(_, (row, _))| row.sort_key());

        let provisional: Vec<u32> = rows.iter().map(|(rid, _)| *rid).collect();
        let rows = rows.into_iter().map(|(_, entry)| entry).collect();
        commit(tables, rows, provisional.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        builder::RemapTokens,
        metadata::tables::{InterfaceImplRaw, NestedClassRaw, TableId, TypeRefRaw},
    };

    fn nested(nested_class: u32, enclosing_class: u32) -> NestedClassRaw {
        NestedClassRaw {
            nested_class,
            enclosing_class,
            ..NestedClassRaw::default()
        }
    }

    #[test]
    fn append_assigns_final_rids() {
        let mut buffer = AppendTableBuffer::<TypeRefRaw>::new();
        assert_eq!(buffer.add(TypeRefRaw::default(), 7), Token::new(0x0100_0001));
        assert_eq!(buffer.add(TypeRefRaw::default(), 0), Token::new(0x0100_0002));
        assert_eq!(buffer.get(2).map(|row| row.rid), Some(2));
        assert!(buffer.get(3).is_none());

        let mut tables = MetadataTables::new();
        let remap = buffer.flush_to_table(&mut tables);
        assert!(buffer.is_empty());
        assert_eq!(tables.type_ref.row_count(), 2);
        assert_eq!(remap.moved(), 0);
        assert_eq!(
            remap.original(Token::new(0x0100_0007)),
            Some(Token::new(0x0100_0001))
        );
    }

    #[test]
    fn sorted_flush_orders_rows_and_remaps_tokens() {
        let mut buffer = SortedTableBuffer::<NestedClassRaw>::new();
        let third = buffer.add(nested(3, 10), 0);
        let first = buffer.add(nested(1, 10), 0);
        let second = buffer.add(nested(2, 10), 0);
        assert_eq!(first, Token::from_parts(TableId::NestedClass, 2));

        let mut tables = MetadataTables::new();
        let remap = buffer.flush_to_table(&mut tables);

        let owners: Vec<u32> = tables.nested_class.iter().map(|row| row.nested_class).collect();
        assert_eq!(owners, [1, 2, 3]);

        let mut captured = first;
        captured.remap_tokens(&remap);
        assert_eq!(captured, Token::from_parts(TableId::NestedClass, 1));
        assert_eq!(
            tables.nested_class.get(captured.row()).map(|row| row.nested_class),
            Some(1)
        );
        assert_eq!(remap.resolve(second), Token::from_parts(TableId::NestedClass, 2));
        assert_eq!(remap.resolve(third), Token::from_parts(TableId::NestedClass, 3));
        assert_eq!(remap.moved(), 3);
    }

    #[test]
    fn equal_keys_keep_insertion_order() {
        let mut buffer = SortedTableBuffer::<InterfaceImplRaw>::new();
        for interface in [5, 4, 6] {
            buffer.add(
                InterfaceImplRaw {
                    class: 1,
                    interface: Token::from_parts(TableId::TypeRef, interface),
                    ..InterfaceImplRaw::default()
                },
                0,
            );
        }

        let mut tables = MetadataTables::new();
        let remap = buffer.flush_to_table(&mut tables);
        assert_eq!(remap.moved(), 0);
        let interfaces: Vec<u32> = tables
            .interface_impl
            .iter()
            .map(|row| row.interface.row())
            .collect();
        assert_eq!(interfaces, [5, 4, 6]);
    }

    #[test]
    fn set_replaces_buffered_row() {
        let mut buffer = SortedTableBuffer::<NestedClassRaw>::new();
        buffer.add(nested(4, 1), 0);
        let old = buffer.set(1, nested(5, 1)).unwrap();
        assert_eq!(old.nested_class, 4);
        assert_eq!(buffer.get(1).map(|row| row.nested_class), Some(5));
        assert!(buffer.set(2, nested(6, 1)).is_none());

        buffer.clear();
        assert!(buffer.is_empty());
    }
}
