use leptos::prelude::*;
use leptos_ui::variants;

variants! {
    Button {
        base: "inline-flex items-center justify-center gap-2 whitespace-nowrap rounded-md text-sm font-medium transition-colors disabled:pointer-events-none disabled:opacity-50 [&_svg]:pointer-events-none [&_svg:not([class*='size-'])]:size-4 shrink-0 [&_svg]:shrink-0 outline-none focus-visible:ring-ring/50 focus-visible:ring-[3px] select-none touch-manipulation [-webkit-tap-highlight-color:transparent]",
        variants: {
            variant: {
                Default: "bg-primary text-primary-foreground shadow-xs hover:bg-primary/90",
                Ghost: "text-muted-foreground hover:bg-accent hover:text-accent-foreground",
                // Drag handles: no hover fill, grab cursor.
                Handle: "text-muted-foreground/60 hover:text-foreground cursor-grab active:cursor-grabbing",
            },
            size: {
                Default: "h-9 px-4 py-2 has-[>svg]:px-3",
                Icon: "size-8",
                Handle: "w-6 h-8",
            }
        },
        component: {
            element: button
        }
    }
}
