//! Recycling doubly-linked list of idle values

/// FIFO list of idle values.
///
/// Nodes live in a slot vector and are linked by index. A popped or removed
/// node has its value cleared and its slot kept for the next push, so once
/// the list has grown to its working size, `push`/`pop` do not allocate.
///
/// The list does no locking of its own; the owning pool serializes access.
///
/// # Examples
///
/// ```
/// use esox_resourcepool::FreeList;
///
/// let mut list = FreeList::new();
/// list.push(1);
/// list.push(2);
/// list.push(3);
///
/// assert_eq!(list.remove_where(|v| v % 2 == 1), vec![1, 3]);
/// assert_eq!(list.pop(), Some(2));
/// assert!(list.is_empty());
/// ```
#[derive(Debug)]
pub struct FreeList<T> {
    nodes: Vec<Node<T>>,
    recycled: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

#[derive(Debug)]
struct Node<T> {
    value: Option<T>,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<T> Default for FreeList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FreeList<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Pre-size the node store for `capacity` values
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            recycled: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Append to the back
    pub fn push(&mut self, value: T) {
        let node = Node {
            value: Some(value),
            prev: self.tail,
            next: None,
        };

        let index = match self.recycled.pop() {
            Some(index) => {
                self.nodes[index] = node;
                index
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };

        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
    }

    /// Remove from the front
    pub fn pop(&mut self) -> Option<T> {
        let head = self.head?;
        self.unlink(head)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove every value matching `should_remove`, front to back.
    ///
    /// Returns the removed values in list order.
    pub fn remove_where<F>(&mut self, mut should_remove: F) -> Vec<T>
    where
        F: FnMut(&T) -> bool,
    {
        let mut removed = Vec::new();
        let mut cursor = self.head;

        while let Some(index) = cursor {
            cursor = self.nodes[index].next;

            let matched = self.nodes[index]
                .value
                .as_ref()
                .is_some_and(|value| should_remove(value));
            if matched && let Some(value) = self.unlink(index) {
                removed.push(value);
            }
        }

        removed
    }

    /// Remove and return every value, front to back
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.len);
        while let Some(value) = self.pop() {
            values.push(value);
        }
        values
    }

    /// Iterate front to back without removing anything
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let node = &self.nodes[cursor?];
            cursor = node.next;
            node.value.as_ref()
        })
    }

    fn unlink(&mut self, index: usize) -> Option<T> {
        let (prev, next) = {
            let node = &self.nodes[index];
            (node.prev, node.next)
        };

        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }

        let node = &mut self.nodes[index];
        node.prev = None;
        node.next = None;
        let value = node.value.take();

        self.recycled.push(index);
        self.len -= 1;
        value
    }
}
