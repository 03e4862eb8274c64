//! Song rows rendered into a [`Document`].
//!
//! A row renders as a `tr` with the class `is-current-item` while its song is
//! the player's current item, and one of the two [`RowClasses`] depending on
//! whether it is playing. Each view owns its bindings, unmounting a view (or
//! dropping it) releases every observer it registered.

use std::rc::Rc;

use crate::{
    binding::{bind_attribute, bind_class, Affix, BindingScope, ClassLabels},
    context::ObjectRef,
    dom::{Document, ElementId},
    error::Error,
    player::Player,
    row::{RowAction, SongRow},
    scheduler::RenderQueue,
    song::Song,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RowClasses {
    pub playing: String,
    pub paused: String,
}

impl Default for RowClasses {
    fn default() -> Self {
        Self {
            playing: "playing".into(),
            paused: "paused".into(),
        }
    }
}

pub struct SongRowView {
    row: Rc<SongRow>,
    element: ElementId,
    title_cell: ElementId,
    toggle: ElementId,
    bindings: BindingScope,
}

impl SongRowView {
    pub fn mount(
        doc: &mut Document,
        queue: &RenderQueue,
        row: Rc<SongRow>,
        classes: &RowClasses,
    ) -> Result<Self, Error> {
        let element = doc.create_element("tr");
        let title_cell = doc.create_element("td");
        let toggle = doc.create_element("button");
        doc.append_child(element, title_cell);
        doc.append_child(element, toggle);

        let mut view = Self {
            row,
            element,
            title_cell,
            toggle,
            bindings: BindingScope::new(),
        };
        if let Err(err) = view.render(doc, queue, classes) {
            view.unmount(doc);
            return Err(err);
        }
        Ok(view)
    }

    fn render(
        &mut self,
        doc: &mut Document,
        queue: &RenderQueue,
        classes: &RowClasses,
    ) -> Result<(), Error> {
        let root: ObjectRef = self.row.clone();
        let bindings = &mut self.bindings;

        let current = bindings.add(bind_class(
            &root,
            "isCurrentItem",
            ClassLabels::default(),
            self.element,
            queue,
        )?);
        let playing = bindings.add(bind_class(
            &root,
            "isPlaying",
            ClassLabels::new(&classes.playing, &classes.paused),
            self.element,
            queue,
        )?);
        for class in [current, playing].into_iter().flatten() {
            doc.add_class(self.element, &class);
        }

        let title = bindings.add(bind_attribute(
            &root,
            "title",
            "song.title",
            Affix::default(),
            self.title_cell,
            queue,
        )?);
        doc.apply_attribute(self.title_cell, "title", &title);

        let label = bindings.add(bind_attribute(
            &root,
            "aria-label",
            "song.title",
            Affix::new("Play or pause ", ""),
            self.toggle,
            queue,
        )?);
        doc.apply_attribute(self.toggle, "aria-label", &label);

        let pressed = bindings.add(bind_attribute(
            &root,
            "data-playing",
            "isPlaying",
            Affix::default(),
            self.toggle,
            queue,
        )?);
        doc.apply_attribute(self.toggle, "data-playing", &pressed);

        Ok(())
    }

    pub fn row(&self) -> &Rc<SongRow> {
        &self.row
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn toggle_button(&self) -> ElementId {
        self.toggle
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn handle(&self, action: RowAction) {
        self.row.handle(action);
    }

    /// A click on the toggle button.
    pub fn click(&self) {
        self.row.toggle();
    }

    pub fn unmount(mut self, doc: &mut Document) {
        self.bindings.clear();
        doc.remove_element(self.element);
    }
}

/// A `table` of song rows sharing one player.
pub struct SongList {
    element: ElementId,
    player: Rc<Player>,
    classes: RowClasses,
    rows: Vec<SongRowView>,
}

impl SongList {
    pub fn mount(
        doc: &mut Document,
        queue: &RenderQueue,
        player: Rc<Player>,
        songs: impl IntoIterator<Item = Rc<Song>>,
        classes: RowClasses,
    ) -> Result<Self, Error> {
        let element = doc.create_element("table");
        let mut list = Self {
            element,
            player,
            classes,
            rows: Vec::new(),
        };
        for song in songs {
            if let Err(err) = list.push(doc, queue, song) {
                list.unmount(doc);
                return Err(err);
            }
        }
        log::debug!("mounted {} rows", list.rows.len());
        Ok(list)
    }

    pub fn push(
        &mut self,
        doc: &mut Document,
        queue: &RenderQueue,
        song: Rc<Song>,
    ) -> Result<(), Error> {
        let row = Rc::new(SongRow::new(Some(song), self.player.clone()));
        let view = SongRowView::mount(doc, queue, row, &self.classes)?;
        doc.append_child(self.element, view.element());
        self.rows.push(view);
        Ok(())
    }

    /// Unmounts and returns the row's song, if `index` is in range.
    pub fn remove(&mut self, doc: &mut Document, index: usize) -> Option<Rc<Song>> {
        if index >= self.rows.len() {
            return None;
        }
        let view = self.rows.remove(index);
        let song = view.row().song();
        view.unmount(doc);
        song
    }

    pub fn rows(&self) -> &[SongRowView] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&SongRowView> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn player(&self) -> &Rc<Player> {
        &self.player
    }

    pub fn unmount(self, doc: &mut Document) {
        for view in self.rows {
            view.unmount(doc);
        }
        doc.remove_element(self.element);
    }
}
