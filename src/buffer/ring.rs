use {
    crate::error::{Error, Result},
    std::{cmp::Ordering, ops::Index},
};

const MIN_CAPACITY: usize = 8;

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Growable circular buffer with O(1) push and pop at both ends.
///
/// Capacity is always a power of two so that logical index `i` maps to the
/// physical slot `(head + i) & mask`. Growing doubles the capacity and
/// re-linearizes the contents, resetting `head` to 0.
#[derive(Clone)]
pub struct RingBuffer<T> {
    buffer: Vec<Option<T>>,
    head: usize,
    count: usize,
    mask: usize,
}

impl<T> RingBuffer<T> {
    pub fn new() -> Self {
        RingBuffer::with_capacity(MIN_CAPACITY)
    }

    /// Rounds `capacity` up to a power of two, at least 8.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY).next_power_of_two();
        RingBuffer {
            buffer: std::iter::repeat_with(|| None).take(capacity).collect(),
            head: 0,
            count: 0,
            mask: capacity - 1,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    fn slot(&self, index: usize) -> usize {
        (self.head + index) & self.mask
    }

    fn check(&self, index: usize) -> Result<()> {
        if index < self.count {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                index,
                len: self.count,
            })
        }
    }

    fn grow(&mut self) {
        let capacity = self.buffer.len() * 2;
        let mut buffer: Vec<Option<T>> = Vec::with_capacity(capacity);

        // head..end, then start..head
        let (front, back) = self.buffer.split_at_mut(self.head);
        buffer.extend(back.iter_mut().map(Option::take));
        buffer.extend(front.iter_mut().map(Option::take));
        buffer.resize_with(capacity, || None);

        self.buffer = buffer;
        self.head = 0;
        self.mask = capacity - 1;
    }

    fn reserve_one(&mut self) {
        if self.count == self.buffer.len() {
            self.grow();
        }
    }

    //<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

    pub fn push_back(&mut self, value: T) {
        self.reserve_one();
        let slot = self.slot(self.count);
        self.buffer[slot] = Some(value);
        self.count += 1;
    }

    pub fn push_front(&mut self, value: T) {
        self.reserve_one();
        self.head = (self.head + self.buffer.len() - 1) & self.mask;
        self.buffer[self.head] = Some(value);
        self.count += 1;
    }

    pub fn pop_front(&mut self) -> Result<T> {
        if self.count == 0 {
            return Err(Error::Empty);
        }
        let value = self.buffer[self.head].take();
        self.head = (self.head + 1) & self.mask;
        self.count -= 1;
        value.ok_or(Error::Empty)
    }

    pub fn pop_back(&mut self) -> Result<T> {
        if self.count == 0 {
            return Err(Error::Empty);
        }
        let slot = self.slot(self.count - 1);
        self.count -= 1;
        self.buffer[slot].take().ok_or(Error::Empty)
    }

    pub fn front(&self) -> Result<&T> {
        self.get(0).map_err(|_| Error::Empty)
    }

    pub fn back(&self) -> Result<&T> {
        match self.count {
            0 => Err(Error::Empty),
            n => self.get(n - 1),
        }
    }

    pub fn get(&self, index: usize) -> Result<&T> {
        self.check(index)?;
        self.buffer[self.slot(index)]
            .as_ref()
            .ok_or(Error::OutOfBounds {
                index,
                len: self.count,
            })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        self.check(index)?;
        let len = self.count;
        let slot = self.slot(index);
        self.buffer[slot]
            .as_mut()
            .ok_or(Error::OutOfBounds { index, len })
    }

    /// Overwrites the element at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, value: T) -> Result<T> {
        Ok(std::mem::replace(self.get_mut(index)?, value))
    }

    /// Inserts at an arbitrary position, shifting whichever side is shorter.
    pub fn insert(&mut self, index: usize, value: T) -> Result<()> {
        if index > self.count {
            return Err(Error::OutOfBounds {
                index,
                len: self.count,
            });
        }
        if index == self.count {
            self.push_back(value);
            return Ok(());
        }
        if index == 0 {
            self.push_front(value);
            return Ok(());
        }

        self.reserve_one();
        if index < self.count / 2 {
            self.head = (self.head + self.buffer.len() - 1) & self.mask;
            for i in 0..index {
                let (to, from) = (self.slot(i), self.slot(i + 1));
                self.buffer[to] = self.buffer[from].take();
            }
        } else {
            for i in (index..self.count).rev() {
                let (to, from) = (self.slot(i + 1), self.slot(i));
                self.buffer[to] = self.buffer[from].take();
            }
        }
        let slot = self.slot(index);
        self.buffer[slot] = Some(value);
        self.count += 1;
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        self.check(index)?;
        if index == 0 {
            return self.pop_front();
        }
        if index == self.count - 1 {
            return self.pop_back();
        }

        let slot = self.slot(index);
        let value = self.buffer[slot].take();
        if index < self.count / 2 {
            for i in (0..index).rev() {
                let (to, from) = (self.slot(i + 1), self.slot(i));
                self.buffer[to] = self.buffer[from].take();
            }
            self.head = (self.head + 1) & self.mask;
        } else {
            for i in index..self.count - 1 {
                let (to, from) = (self.slot(i), self.slot(i + 1));
                self.buffer[to] = self.buffer[from].take();
            }
        }
        self.count -= 1;
        value.ok_or(Error::OutOfBounds {
            index,
            len: self.count + 1,
        })
    }

    pub fn clear(&mut self) {
        for slot in self.buffer.iter_mut() {
            *slot = None;
        }
        self.head = 0;
        self.count = 0;
    }

    fn check_range(&self, index: usize, count: usize) -> Result<()> {
        match index.checked_add(count) {
            Some(end) if end <= self.count => Ok(()),
            _ => Err(Error::OutOfBounds {
                index: index.saturating_add(count),
                len: self.count,
            }),
        }
    }

    pub fn reverse_range(&mut self, index: usize, count: usize) -> Result<()> {
        self.check_range(index, count)?;
        if count < 2 {
            return Ok(());
        }
        let (mut i, mut j) = (index, index + count - 1);
        while i < j {
            let (a, b) = (self.slot(i), self.slot(j));
            self.buffer.swap(a, b);
            i += 1;
            j -= 1;
        }
        Ok(())
    }

    /// Stable sort of `count` elements starting at `index`.
    pub fn sort_range_by(
        &mut self,
        index: usize,
        count: usize,
        mut compare: impl FnMut(&T, &T) -> Ordering,
    ) -> Result<()> {
        self.check_range(index, count)?;
        let mut run: Vec<T> = Vec::with_capacity(count);
        for i in index..index + count {
            let slot = self.slot(i);
            run.extend(self.buffer[slot].take());
        }
        run.sort_by(|a, b| compare(a, b));
        for (offset, value) in run.into_iter().enumerate() {
            let slot = self.slot(index + offset);
            self.buffer[slot] = Some(value);
        }
        Ok(())
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            ring: self,
            front: 0,
            back: self.count,
        }
    }
}

impl<T: PartialEq> RingBuffer<T> {
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.iter().position(|x| x == value)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.index_of(value).is_some()
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Copies every element into `dest` starting at `offset`.
    pub fn copy_to(&self, dest: &mut [T], offset: usize) -> Result<()> {
        let end = offset.saturating_add(self.count);
        if end > dest.len() {
            return Err(Error::OutOfBounds {
                index: end,
                len: dest.len(),
            });
        }
        for (to, from) in dest[offset..end].iter_mut().zip(self.iter()) {
            *to = from.clone();
        }
        Ok(())
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

impl<T> Default for RingBuffer<T> {
    fn default() -> Self {
        RingBuffer::new()
    }
}

impl<T> Index<usize> for RingBuffer<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> FromIterator<T> for RingBuffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut ring = RingBuffer::new();
        ring.extend(iter);
        ring
    }
}

impl<T> Extend<T> for RingBuffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<'a, T> IntoIterator for &'a RingBuffer<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Front-to-back iterator; `.rev()` walks back-to-front.
pub struct Iter<'a, T> {
    ring: &'a RingBuffer<T>,
    front: usize,
    back: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        let item = self.ring.buffer[self.ring.slot(self.front)].as_ref();
        self.front += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        self.ring.buffer[self.ring.slot(self.back)].as_ref()
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
