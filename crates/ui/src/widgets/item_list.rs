use engine::{Item, ItemKind};
use iced::widget::{Column, button, scrollable, text};
use iced::{Element, Length};

fn kind_label(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Image => "image",
        ItemKind::Video => "video",
        ItemKind::DocumentPage => "page",
    }
}

/// Row text for one item; the shown item is marked.
pub fn item_label(index: usize, item: &Item, current: Option<usize>) -> String {
    let marker = if current == Some(index) { '>' } else { ' ' };
    format!("{marker} {:>3}  {}  ({})", index + 1, item.id, kind_label(item.kind))
}

/// Renders the playlist. Pressing a row jumps to it while `on_select` is set.
pub fn view<'a, Message>(
    items: &'a [Item],
    current: Option<usize>,
    on_select: Option<fn(usize) -> Message>,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    let rows = items.iter().enumerate().map(|(index, item)| {
        button(text(item_label(index, item, current)))
            .width(Length::Fill)
            .on_press_maybe(on_select.map(|on_select| on_select(index)))
            .into()
    });

    scrollable(Column::with_children(rows).spacing(4))
        .height(Length::Fill)
        .into()
}

#[cfg(test)]
mod tests {
    use engine::{Item, ItemKind};

    use super::item_label;

    #[test]
    fn current_item_is_marked() {
        let item = Item::new("intro", ItemKind::Video, "intro.mp4");

        assert_eq!(item_label(0, &item, Some(0)), ">   1  intro  (video)");
        assert_eq!(item_label(0, &item, None), "    1  intro  (video)");
    }

    #[test]
    fn document_pages_use_short_label() {
        let item = Item::new("notes-2", ItemKind::DocumentPage, "notes.pdf#2");

        assert!(item_label(4, &item, Some(1)).ends_with("notes-2  (page)"));
    }
}
